//! Resilience patterns for fault tolerance
//!
//! Generic, reusable pieces consumed by the fetch pipeline:
//! - **Request pacing**: process-wide minimum-interval gate
//! - **Retry decisions**: per-error backoff policy support
//! - **Clock abstraction**: deterministic timing in tests (`MockClock`)

pub mod clock;
pub mod rate_limiter;
pub mod retry;

// Re-export clock types
pub use clock::{Clock, MockClock, SystemClock};
// Re-export pacing and retry types
pub use rate_limiter::RequestPacer;
pub use retry::{honor_decision, RetryDecision, RetryPolicy};

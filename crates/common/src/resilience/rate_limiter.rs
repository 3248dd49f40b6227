//! Minimum-interval request pacing
//!
//! Process-wide gate enforcing a fixed minimum interval between any two
//! outbound API calls, shared by every call site (profile fetch, membership
//! lookup, connectivity probe). This is advisory backpressure for
//! cooperative callers, not an admission-control queue.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

use super::clock::{Clock, SystemClock};

/// Shared minimum-interval gate.
///
/// Holds a single "time of last call" value behind a mutex; the lock is
/// held across the sleep so concurrent callers line up one interval apart
/// instead of stampeding when the gate opens.
pub struct RequestPacer<C: Clock = SystemClock> {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
    clock: C,
}

impl RequestPacer<SystemClock> {
    /// Pacer using the real system clock.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self::with_clock(min_interval, SystemClock)
    }
}

impl<C: Clock> RequestPacer<C> {
    /// Pacer with an injected clock, used by tests.
    #[must_use]
    pub fn with_clock(min_interval: Duration, clock: C) -> Self {
        Self { min_interval, last_call: Mutex::new(None), clock }
    }

    /// Wait until at least the minimum interval has passed since the
    /// previous call, then mark this call as the latest.
    ///
    /// Returns the delay that was applied, which tests use to verify
    /// spacing without measuring wall time.
    pub async fn acquire(&self) -> Duration {
        let mut last = self.last_call.lock().await;
        let now = self.clock.now();

        let wait = match *last {
            Some(prev) => {
                let elapsed = now.saturating_duration_since(prev);
                self.min_interval.saturating_sub(elapsed)
            }
            None => Duration::ZERO,
        };

        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis() as u64, "Pacing outbound request");
            tokio::time::sleep(wait).await;
        }

        // Record the moment this request is released, not when it arrived.
        *last = Some(now + wait);

        wait
    }

    /// The configured minimum interval.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

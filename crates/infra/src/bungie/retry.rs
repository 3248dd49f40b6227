//! Failure classification and backoff schedule for Platform calls
//!
//! Each failed attempt is classified into a [`FetchFailure`], and
//! [`BungieRetryPolicy`] maps that class plus the attempt counter to a
//! backoff. Delays follow the Platform's documented guidance: honor
//! `Retry-After` on throttling, back off linearly on outages and timeouts.

use std::time::Duration;

use vaultwatch_common::{RetryDecision, RetryPolicy};
use vaultwatch_domain::constants::RATE_LIMIT_DEFAULT_WAIT_SECS;
use vaultwatch_domain::VaultWatchError;

/// Why one fetch attempt failed.
#[derive(Debug)]
pub enum FetchFailure {
    /// 401 from the Platform; the session was cleared before retrying.
    Unauthorized,
    /// 429 with the wait the server asked for.
    Throttled { retry_after: Duration },
    /// 503, the Platform is down or in maintenance.
    Unavailable,
    /// The request hit the client-side timeout.
    TimedOut,
    /// Could not reach the host at all.
    Connection(String),
    /// Not retryable; surfaces to the caller as-is.
    Fatal(VaultWatchError),
}

impl FetchFailure {
    /// Convert into the domain error surfaced when attempts run out.
    pub fn into_error(self) -> VaultWatchError {
        match self {
            Self::Unauthorized => {
                VaultWatchError::Auth("profile request rejected (401)".to_string())
            }
            Self::Throttled { .. } => {
                VaultWatchError::Network("rate limited by the API (429)".to_string())
            }
            Self::Unavailable => {
                VaultWatchError::Network("API unavailable (503)".to_string())
            }
            Self::TimedOut => VaultWatchError::Timeout("profile request timed out".to_string()),
            Self::Connection(msg) => VaultWatchError::Network(msg),
            Self::Fatal(e) => e,
        }
    }
}

/// Default backoff schedule for profile fetches.
#[derive(Debug, Clone, Copy, Default)]
pub struct BungieRetryPolicy;

impl RetryPolicy<FetchFailure> for BungieRetryPolicy {
    fn decide(&self, error: &FetchFailure, attempt: u32) -> RetryDecision {
        let attempt = u64::from(attempt);
        match error {
            // The session was already cleared; retry immediately so the
            // token manager can re-authorize.
            FetchFailure::Unauthorized => RetryDecision::Retry(Duration::ZERO),
            FetchFailure::Throttled { retry_after } => RetryDecision::Retry(*retry_after),
            FetchFailure::Unavailable | FetchFailure::Connection(_) => {
                RetryDecision::Retry(Duration::from_secs(5 * (attempt + 1)))
            }
            FetchFailure::TimedOut => RetryDecision::Retry(Duration::from_secs(2 * (attempt + 1))),
            FetchFailure::Fatal(_) => RetryDecision::Stop,
        }
    }
}

/// Wait taken from a `Retry-After` header, falling back to the default.
pub(crate) fn retry_after_wait(header: Option<&str>) -> Duration {
    header
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(Duration::from_secs(RATE_LIMIT_DEFAULT_WAIT_SECS), Duration::from_secs)
}

//! Retry decisions and attempt-loop support
//!
//! Generic pieces of the resilient fetch pipeline: a per-error retry
//! decision, a policy trait the pipeline consults between attempts, and the
//! sleep helper that honors the decided delay.

use std::time::Duration;

use tracing::debug;

/// Decision made after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after sleeping the given delay.
    Retry(Duration),
    /// Give up and surface the error.
    Stop,
}

/// Policy mapping an error and the attempt counter to a decision.
///
/// `attempt` is zero-based; policies never see the final attempt, the
/// caller stops unconditionally once the budget is spent.
pub trait RetryPolicy<E> {
    fn decide(&self, error: &E, attempt: u32) -> RetryDecision;
}

/// Sleep out a retry decision.
///
/// Returns `true` if the caller should retry, `false` on [`RetryDecision::Stop`].
pub async fn honor_decision(decision: RetryDecision) -> bool {
    match decision {
        RetryDecision::Retry(delay) => {
            if !delay.is_zero() {
                debug!(delay_secs = delay.as_secs(), "Backing off before retry");
                tokio::time::sleep(delay).await;
            }
            true
        }
        RetryDecision::Stop => false,
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for resilience::retry.
    use super::*;

    struct FlakyPolicy;

    impl RetryPolicy<&'static str> for FlakyPolicy {
        fn decide(&self, error: &&'static str, attempt: u32) -> RetryDecision {
            match *error {
                "transient" => RetryDecision::Retry(Duration::from_millis(u64::from(attempt) + 1)),
                _ => RetryDecision::Stop,
            }
        }
    }

    #[test]
    fn policy_distinguishes_transient_from_fatal() {
        let policy = FlakyPolicy;
        assert_eq!(
            policy.decide(&"transient", 0),
            RetryDecision::Retry(Duration::from_millis(1))
        );
        assert_eq!(policy.decide(&"fatal", 0), RetryDecision::Stop);
    }

    #[tokio::test]
    async fn honor_decision_reports_retry_versus_stop() {
        assert!(honor_decision(RetryDecision::Retry(Duration::ZERO)).await);
        assert!(!honor_decision(RetryDecision::Stop).await);
    }
}

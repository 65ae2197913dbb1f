//! Exponential backoff policy
//!
//! Pure computation: given an attempt number, produce the delay to wait
//! before the next attempt. Deterministic so tests never need mocking;
//! jitter is layered on top by the retry loop, not here.

use crate::config::RetryConfig;
use std::time::Duration;

/// Doublings beyond this would overflow any practical Duration anyway
const MAX_DOUBLINGS: u32 = 31;

/// Exponential backoff: `base * 2^(attempt-1)`, clamped to a maximum
///
/// Attempt numbers are 1-based: the delay after the first failed attempt is
/// `base`, after the second `2 * base`, and so on. Delays are monotonically
/// non-decreasing in the attempt number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
    max: Duration,
}

impl BackoffPolicy {
    /// Create a policy from a base delay and an upper clamp
    #[must_use]
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// The delay to wait after the given failed attempt (1-based)
    ///
    /// Attempt 0 is treated as attempt 1 so a miscounted caller gets the
    /// base delay rather than a zero-length sleep.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(1).min(MAX_DOUBLINGS);
        // 1 << doublings fits in u32 because doublings <= 31
        let factor = 1u32 << doublings;
        self.base
            .checked_mul(factor)
            .unwrap_or(self.max)
            .min(self.max)
    }
}

impl From<&RetryConfig> for BackoffPolicy {
    fn from(retry: &RetryConfig) -> Self {
        Self::new(retry.base_delay, retry.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy_secs(base: u64, max: u64) -> BackoffPolicy {
        BackoffPolicy::new(Duration::from_secs(base), Duration::from_secs(max))
    }

    #[test]
    fn first_attempt_waits_the_base_delay() {
        let policy = policy_secs(1, 60);
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
    }

    #[test]
    fn delay_doubles_per_attempt() {
        let policy = policy_secs(1, 60);
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(4), Duration::from_secs(8));
    }

    #[test]
    fn delay_is_clamped_to_max() {
        let policy = policy_secs(1, 5);
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(4), Duration::from_secs(5));
        assert_eq!(policy.delay_for(10), Duration::from_secs(5));
    }

    #[test]
    fn delay_is_monotonically_non_decreasing() {
        let policy = policy_secs(1, 30);
        let mut previous = Duration::ZERO;
        for attempt in 1..=40 {
            let delay = policy.delay_for(attempt);
            assert!(
                delay >= previous,
                "delay for attempt {attempt} ({delay:?}) shrank below {previous:?}"
            );
            previous = delay;
        }
    }

    #[test]
    fn huge_attempt_numbers_do_not_overflow() {
        let policy = policy_secs(1, 60);
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn attempt_zero_is_treated_as_attempt_one() {
        let policy = policy_secs(3, 60);
        assert_eq!(policy.delay_for(0), policy.delay_for(1));
    }

    #[test]
    fn policy_is_deterministic() {
        let policy = policy_secs(2, 60);
        assert_eq!(policy.delay_for(3), policy.delay_for(3));
    }

    #[test]
    fn built_from_retry_config() {
        let retry = RetryConfig {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            ..RetryConfig::default()
        };
        let policy = BackoffPolicy::from(&retry);
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_secs(1));
    }
}

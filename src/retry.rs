//! Retry loop with exponential backoff
//!
//! This module provides configurable retry logic for transient failures.
//! The loop is explicit (never recursive), counts attempts from 1, and
//! fails fast on errors classified as non-retryable. Jitter is optionally
//! applied on top of the deterministic [`BackoffPolicy`] to prevent
//! thundering herd.
//!
//! # Example
//!
//! ```no_run
//! use fetchpool::backoff::BackoffPolicy;
//! use fetchpool::retry::{IsRetryable, retry_with_backoff};
//! use std::time::Duration;
//!
//! #[derive(Debug, thiserror::Error)]
//! enum MyError {
//!     #[error("transient")]
//!     Transient,
//!     #[error("permanent")]
//!     Permanent,
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Transient)
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(60));
//! let (value, attempts) = retry_with_backoff(policy, 3, false, |_attempt| async {
//!     Ok::<_, MyError>(42)
//! })
//! .await?;
//! assert_eq!((value, attempts), (42, 1));
//! # Ok(())
//! # }
//! ```

use crate::backoff::BackoffPolicy;
use crate::error::FetchError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (network errors, timeouts, server overload) should
/// return `true`. Failures a retry cannot fix (bad URL, client error
/// statuses) should return `false` so the loop gives up immediately.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            // Transport failures are transient by default; a flaky network
            // is exactly what the retry budget exists for
            FetchError::Network(_) => true,
            FetchError::Timeout { .. } => true,
            // Only statuses that can plausibly clear on their own
            FetchError::Status { status } => *status == 429 || *status >= 500,
            FetchError::NonRetryable { .. } => false,
        }
    }
}

/// Terminal failure of a retried operation
///
/// Carries the last underlying error and the total attempts made, whether
/// the budget was exhausted or a non-retryable error ended the loop early.
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempt(s): {source}")]
pub struct RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Total attempts made, first try included
    pub attempts: u32,
    /// The last error observed
    #[source]
    pub source: E,
}

/// Execute an async operation with bounded attempts and exponential backoff
///
/// The operation is invoked with the current attempt number (1-based) so
/// callers can log or report per-attempt progress. On success the value is
/// returned together with the number of attempts it took. `max_attempts` is
/// the total try budget: `1` means one shot, no retry. Each retry is a fresh
/// invocation; no partial progress carries over between attempts.
///
/// The sleep between attempts is `policy.delay_for(attempt)`, jittered into
/// `[delay, 2 * delay]` when `jitter` is set.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: BackoffPolicy,
    max_attempts: u32,
    jitter: bool,
    mut operation: F,
) -> Result<(T, u32), RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::error::Error + 'static,
{
    let mut attempt: u32 = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "operation succeeded after retry");
                }
                return Ok((value, attempt));
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.delay_for(attempt);
                let delay = if jitter { add_jitter(delay) } else { delay };

                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "attempt failed, retrying"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = attempt,
                        "all attempts exhausted"
                    );
                } else {
                    tracing::error!(
                        error = %e,
                        attempts = attempt,
                        "non-retryable failure, giving up"
                    );
                }
                return Err(RetryError {
                    attempts: attempt,
                    source: e,
                });
            }
        }
    }
}

/// Add random jitter to a delay to prevent thundering herd
///
/// Jitter is uniformly distributed between 0% and 100% of the delay, so the
/// actual delay lands between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}

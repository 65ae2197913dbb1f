//! Error types for fetchpool
//!
//! Errors are split along the pipeline's seams:
//! - [`Error`] - crate-level failures (invalid configuration, client
//!   construction); these are the only errors a batch call itself returns
//! - [`FetchError`] - a single fetch attempt's failure, fed to the retry loop
//! - [`ExtractError`] - extraction failed on an otherwise-successful fetch
//! - [`TaskError`] - a URL's terminal outcome error, recorded in the batch
//!   report and never propagated as a batch-wide fault

use std::time::Duration;
use thiserror::Error;

/// Result type alias for fetchpool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error
///
/// A batch run only fails as a whole on programming-level misuse; per-URL
/// failures are recorded in the report instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "concurrency")
        key: Option<String>,
    },

    /// Failed to construct the bundled HTTP client
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Failure of a single fetch attempt
///
/// The retry loop classifies these via
/// [`IsRetryable`](crate::retry::IsRetryable): network errors and timeouts
/// are transient, HTTP statuses retry only when a later attempt could
/// plausibly succeed (429 and 5xx), and [`FetchError::NonRetryable`] fails
/// fast, skipping any remaining attempts.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, TLS, body read)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The attempt exceeded its time budget
    #[error("request timed out after {timeout:?}")]
    Timeout {
        /// The per-attempt budget that was exceeded
        timeout: Duration,
    },

    /// Non-success HTTP status
    #[error("HTTP status {status}")]
    Status {
        /// The status code received
        status: u16,
    },

    /// Failure that must not be retried (e.g., an unparseable URL)
    #[error("non-retryable: {reason}")]
    NonRetryable {
        /// Why the attempt can never succeed
        reason: String,
    },
}

/// Extraction failed on a successfully fetched body
///
/// Treated exactly like a terminal fetch failure for that URL: recorded,
/// never a batch abort.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The body could not be parsed into the expected shape
    #[error("malformed content: {0}")]
    Malformed(String),

    /// A required element or field was absent from the body
    #[error("missing field: {0}")]
    MissingField(String),
}

/// Terminal error for one URL's task
///
/// Every input URL ends with exactly one outcome; when that outcome is a
/// failure, this is the error it carries.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Every permitted fetch attempt failed, or a non-retryable error ended
    /// the attempts early
    #[error("fetch failed after {attempts} attempt(s): {source}")]
    Fetch {
        /// Total attempts made before giving up
        attempts: u32,
        /// The last underlying fetch error
        #[source]
        source: FetchError,
    },

    /// Fetch succeeded but extraction failed
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// The batch was cancelled before this task completed
    #[error("batch cancelled")]
    Cancelled,

    /// The task panicked; accounted as a failure rather than aborting the batch
    #[error("task panicked")]
    Panicked,
}

impl TaskError {
    /// True if this error is a cancellation rather than a genuine failure
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskError::Cancelled)
    }
}

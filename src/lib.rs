//! # fetchpool
//!
//! Bounded-concurrency fetch-and-extract pipeline: give it a list of URLs
//! and it fetches each one over HTTP with retry-and-backoff on transient
//! failure, extracts a record from every successful response, and hands
//! back one accounted outcome per URL - all while never exceeding the
//! configured number of in-flight requests.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Partial failure is normal** - One URL's failure never aborts the
//!   batch; zero successes is a valid outcome, not an error
//! - **Narrow seams** - The HTTP transport ([`Fetcher`]) and the record
//!   shape ([`Extract`]) are caller-replaceable traits with bundled
//!   defaults
//! - **Event-driven** - Consumers subscribe to progress events, no polling
//!   required
//!
//! ## Quick Start
//!
//! ```no_run
//! use fetchpool::{Config, TitleExtractor, run_batch};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let urls = vec![
//!         "https://www.rust-lang.org/".to_string(),
//!         "https://www.wikipedia.org/".to_string(),
//!     ];
//!
//!     let report = run_batch(urls, Config::default(), TitleExtractor).await?;
//!
//!     for record in report.records() {
//!         println!("{}: {}", record.url, record.title);
//!     }
//!     for (url, error) in report.failures() {
//!         eprintln!("{url} failed: {error}");
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Exponential backoff policy
pub mod backoff;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Record extraction
pub mod extract;
/// HTTP fetching
pub mod fetch;
/// Retry loop with exponential backoff
pub mod retry;
/// Batch orchestration
pub mod runner;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use backoff::BackoffPolicy;
pub use config::{Config, ErrorMode, FetchConfig, RetryConfig};
pub use error::{Error, ExtractError, FetchError, Result, TaskError};
pub use extract::{Extract, PageRecord, TitleExtractor};
pub use fetch::{FetchedPage, Fetcher, HttpFetcher};
pub use retry::{IsRetryable, RetryError, retry_with_backoff};
pub use runner::{BatchRunner, run_batch};
pub use types::{BatchReport, BatchStats, Event, UrlOutcome};

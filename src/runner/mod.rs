//! Batch orchestration split into focused submodules
//!
//! - `orchestrate` - fan-out, admission gating, and ordered result
//!   collection (`BatchRunner::run`)
//! - `task` - the per-URL execution path: permit, retry, extract

mod orchestrate;
mod task;


use crate::config::Config;
use crate::error::Result;
use crate::extract::Extract;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::types::{BatchReport, Event};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Buffer size for the event broadcast channel; slow subscribers see
/// `Lagged` rather than holding the pipeline back
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Orchestrates batches of URLs through fetch, retry, and extraction
///
/// Cheap to clone - all state is Arc-wrapped. One runner can execute many
/// batches; every [`run`](BatchRunner::run) call creates its own admission
/// gate, so no state leaks between batches.
pub struct BatchRunner<F, E> {
    pub(crate) fetcher: Arc<F>,
    pub(crate) extractor: Arc<E>,
    pub(crate) config: Arc<Config>,
    pub(crate) event_tx: broadcast::Sender<Event>,
    pub(crate) cancel_token: CancellationToken,
}

// Manual impl: deriving would demand F: Clone and E: Clone, but only the
// Arcs are cloned
impl<F, E> Clone for BatchRunner<F, E> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            extractor: Arc::clone(&self.extractor),
            config: Arc::clone(&self.config),
            event_tx: self.event_tx.clone(),
            cancel_token: self.cancel_token.clone(),
        }
    }
}

impl<F, E> BatchRunner<F, E>
where
    F: Fetcher + 'static,
    E: Extract + 'static,
{
    /// Create a runner, validating the configuration
    ///
    /// Misuse (zero concurrency, zero attempts, zero timeout) fails here,
    /// before any task could be scheduled.
    pub fn new(config: Config, fetcher: F, extractor: E) -> Result<Self> {
        config.validate()?;

        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(extractor),
            config: Arc::new(config),
            event_tx,
            cancel_token: CancellationToken::new(),
        })
    }

    /// Subscribe to batch events
    ///
    /// Multiple subscribers are supported; each receives all events
    /// independently. If there are no subscribers, events are dropped and
    /// the batch carries on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Signal every queued and in-flight task to stop
    ///
    /// In-flight tasks abort at their next suspension point, release their
    /// permits by drop, and report a cancelled outcome; queued tasks never
    /// start fetching. The batch still returns a complete report.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// The batch-wide cancellation token, for wiring into external shutdown
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Current configuration
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Emit an event to all subscribers
    ///
    /// send() returns Err when there are no receivers, which is fine - the
    /// event is simply dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}

/// Fetch a batch of URLs with the bundled HTTP fetcher
///
/// Convenience entry point: builds an [`HttpFetcher`] from the
/// configuration's user agent, runs one batch to completion, and returns
/// the report. Fails only on configuration misuse or client construction.
///
/// # Example
///
/// ```no_run
/// use fetchpool::{Config, TitleExtractor, run_batch};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let urls = vec!["https://www.rust-lang.org/".to_string()];
/// let report = run_batch(urls, Config::default(), TitleExtractor).await?;
/// for record in report.records() {
///     println!("{}: {}", record.url, record.title);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn run_batch<E>(
    urls: Vec<String>,
    config: Config,
    extractor: E,
) -> Result<BatchReport<E::Record>>
where
    E: Extract + 'static,
{
    let fetcher = HttpFetcher::new(&config.fetch.user_agent)?;
    let runner = BatchRunner::new(config, fetcher, extractor)?;
    Ok(runner.run(urls).await)
}

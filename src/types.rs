//! Core types and events

use crate::error::TaskError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Events broadcast during a batch run
///
/// Consumers subscribe via
/// [`BatchRunner::subscribe`](crate::runner::BatchRunner::subscribe);
/// events are lossy if no one is listening, so emitting never blocks the
/// pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Event {
    /// A task obtained an admission permit and began fetching
    TaskStarted {
        /// The URL being fetched
        url: String,
    },

    /// An attempt failed; the task is about to try again
    TaskRetrying {
        /// The URL being retried
        url: String,
        /// The attempt about to start (1-based)
        attempt: u32,
    },

    /// A task produced a record
    TaskSucceeded {
        /// The URL that succeeded
        url: String,
        /// Total fetch attempts it took
        attempts: u32,
    },

    /// A task failed terminally; the batch carries on
    TaskFailed {
        /// The URL that failed
        url: String,
        /// Total fetch attempts made
        attempts: u32,
        /// Error message
        error: String,
    },

    /// Every task has reported an outcome
    BatchCompleted {
        /// Number of URLs that produced a record
        succeeded: usize,
        /// Number of URLs that failed
        failed: usize,
    },
}

/// Terminal outcome of one URL's task
///
/// Exactly one outcome exists per input URL; a URL is never silently
/// dropped without an accounted failure.
#[derive(Debug)]
pub enum UrlOutcome<R> {
    /// Fetch and extraction both succeeded
    Success {
        /// The input URL
        url: String,
        /// The extracted record
        record: R,
        /// Total fetch attempts it took
        attempts: u32,
    },

    /// The task failed terminally; sibling tasks were unaffected
    Failed {
        /// The input URL
        url: String,
        /// What went wrong
        error: TaskError,
        /// Total fetch attempts made (0 if cancelled before fetching)
        attempts: u32,
    },
}

impl<R> UrlOutcome<R> {
    /// The input URL this outcome belongs to
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            UrlOutcome::Success { url, .. } | UrlOutcome::Failed { url, .. } => url,
        }
    }

    /// Total fetch attempts made for this URL
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            UrlOutcome::Success { attempts, .. } | UrlOutcome::Failed { attempts, .. } => *attempts,
        }
    }

    /// True if this outcome carries a record
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, UrlOutcome::Success { .. })
    }

    /// The extracted record, if the task succeeded
    #[must_use]
    pub fn record(&self) -> Option<&R> {
        match self {
            UrlOutcome::Success { record, .. } => Some(record),
            UrlOutcome::Failed { .. } => None,
        }
    }

    /// The terminal error, if the task failed
    #[must_use]
    pub fn error(&self) -> Option<&TaskError> {
        match self {
            UrlOutcome::Failed { error, .. } => Some(error),
            UrlOutcome::Success { .. } => None,
        }
    }
}

/// Aggregate counters for a completed batch
///
/// `total` always equals the input URL count, whatever the error mode;
/// zero successes is a valid, non-exceptional outcome.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BatchStats {
    /// Number of input URLs
    pub total: usize,
    /// URLs that produced a record
    pub succeeded: usize,
    /// URLs that failed terminally (including cancelled ones)
    pub failed: usize,
    /// Wall-clock duration of the batch run
    pub elapsed: Duration,
}

/// Result of a batch run: per-URL outcomes plus aggregate stats
///
/// Outcomes are ordered to match the input URL order. Under
/// [`ErrorMode::OmitFailed`](crate::config::ErrorMode::OmitFailed) the
/// failed outcomes are dropped from the list but stay accounted in
/// [`stats`](BatchReport::stats).
#[derive(Debug)]
pub struct BatchReport<R> {
    outcomes: Vec<UrlOutcome<R>>,
    stats: BatchStats,
}

impl<R> BatchReport<R> {
    pub(crate) fn new(outcomes: Vec<UrlOutcome<R>>, stats: BatchStats) -> Self {
        Self { outcomes, stats }
    }

    /// Per-URL outcomes in input order
    #[must_use]
    pub fn outcomes(&self) -> &[UrlOutcome<R>] {
        &self.outcomes
    }

    /// Consume the report, yielding the outcomes
    #[must_use]
    pub fn into_outcomes(self) -> Vec<UrlOutcome<R>> {
        self.outcomes
    }

    /// Successfully extracted records, in input order
    pub fn records(&self) -> impl Iterator<Item = &R> {
        self.outcomes.iter().filter_map(UrlOutcome::record)
    }

    /// Consume the report, yielding the records in input order
    #[must_use]
    pub fn into_records(self) -> Vec<R> {
        self.outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                UrlOutcome::Success { record, .. } => Some(record),
                UrlOutcome::Failed { .. } => None,
            })
            .collect()
    }

    /// Failed URLs with their terminal errors, in input order
    pub fn failures(&self) -> impl Iterator<Item = (&str, &TaskError)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            UrlOutcome::Failed { url, error, .. } => Some((url.as_str(), error)),
            UrlOutcome::Success { .. } => None,
        })
    }

    /// Aggregate counters for the run
    #[must_use]
    pub fn stats(&self) -> BatchStats {
        self.stats
    }
}

//! Batch fan-out and ordered result collection.

use super::BatchRunner;
use super::task::{self, TaskContext};
use crate::config::ErrorMode;
use crate::error::TaskError;
use crate::extract::Extract;
use crate::fetch::Fetcher;
use crate::types::{BatchReport, BatchStats, Event, UrlOutcome};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

impl<F, E> BatchRunner<F, E>
where
    F: Fetcher + 'static,
    E: Extract + 'static,
{
    /// Run one batch to completion
    ///
    /// Spawns one task per URL up front; tasks begin fetching as soon as
    /// the admission gate lets them through. Returns once every task has
    /// reported an outcome - one URL's terminal failure never cancels its
    /// siblings and never fails the batch. Outcomes are placed in input
    /// order regardless of completion order.
    pub async fn run(&self, urls: Vec<String>) -> BatchReport<E::Record> {
        let started = Instant::now();
        let total = urls.len();
        tracing::info!(
            total,
            concurrency = self.config.fetch.concurrency,
            "starting batch"
        );

        // One gate per run; its permits are the only thing serializing tasks
        let gate = Arc::new(Semaphore::new(self.config.fetch.concurrency));

        let mut join_set = JoinSet::new();
        let mut spawned: HashMap<tokio::task::Id, (usize, String)> =
            HashMap::with_capacity(total);

        for (index, url) in urls.into_iter().enumerate() {
            let ctx = TaskContext {
                url: url.clone(),
                gate: Arc::clone(&gate),
                fetcher: Arc::clone(&self.fetcher),
                extractor: Arc::clone(&self.extractor),
                config: Arc::clone(&self.config),
                event_tx: self.event_tx.clone(),
                cancel_token: self.cancel_token.clone(),
            };
            let handle = join_set.spawn(async move { (index, task::run_task(ctx).await) });
            spawned.insert(handle.id(), (index, url));
        }

        // Slots keyed by input index so completion order never reorders
        // the report
        let mut slots: Vec<Option<UrlOutcome<E::Record>>> = Vec::with_capacity(total);
        slots.resize_with(total, || None);

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(join_err) => {
                    // A faulted task is accounted as that URL's failure,
                    // never a batch abort
                    if let Some((index, url)) = spawned.get(&join_err.id()).cloned() {
                        tracing::error!(url = %url, error = %join_err, "task faulted");
                        let error = if join_err.is_cancelled() {
                            TaskError::Cancelled
                        } else {
                            TaskError::Panicked
                        };
                        slots[index] = Some(UrlOutcome::Failed {
                            url,
                            error,
                            attempts: 0,
                        });
                    } else {
                        tracing::error!(error = %join_err, "join error for unknown task");
                    }
                }
            }
        }

        let outcomes: Vec<UrlOutcome<E::Record>> = slots.into_iter().flatten().collect();
        debug_assert_eq!(outcomes.len(), total, "every URL must have an outcome");

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let failed = total - succeeded;
        let elapsed = started.elapsed();

        self.emit_event(Event::BatchCompleted { succeeded, failed });
        tracing::info!(
            total,
            succeeded,
            failed,
            elapsed_ms = elapsed.as_millis() as u64,
            "batch completed"
        );

        let outcomes = match self.config.error_mode {
            ErrorMode::IncludeFailed => outcomes,
            // Compatibility mode: the outcome list drops failures, but the
            // stats above still account for every input URL
            ErrorMode::OmitFailed => outcomes.into_iter().filter(|o| o.is_success()).collect(),
        };

        BatchReport::new(
            outcomes,
            BatchStats {
                total,
                succeeded,
                failed,
                elapsed,
            },
        )
    }
}

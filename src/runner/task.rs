//! Per-URL task execution: admission, retried fetch, extraction.

use crate::backoff::BackoffPolicy;
use crate::config::Config;
use crate::error::TaskError;
use crate::extract::Extract;
use crate::fetch::Fetcher;
use crate::retry::retry_with_backoff;
use crate::types::{Event, UrlOutcome};
use std::sync::Arc;
use tokio::sync::{Semaphore, broadcast};
use tokio_util::sync::CancellationToken;

/// Everything one URL's task needs, bundled for the spawn call
pub(super) struct TaskContext<F, E> {
    pub(super) url: String,
    pub(super) gate: Arc<Semaphore>,
    pub(super) fetcher: Arc<F>,
    pub(super) extractor: Arc<E>,
    pub(super) config: Arc<Config>,
    pub(super) event_tx: broadcast::Sender<Event>,
    pub(super) cancel_token: CancellationToken,
}

/// Run one URL to its terminal outcome
///
/// The admission permit is held across the fetch (including backoff sleeps
/// between attempts) and released before extraction: extraction is local
/// CPU work and must not block other tasks' network admission. Every exit
/// path releases the permit by drop.
pub(super) async fn run_task<F, E>(ctx: TaskContext<F, E>) -> UrlOutcome<E::Record>
where
    F: Fetcher + 'static,
    E: Extract + 'static,
{
    let TaskContext {
        url,
        gate,
        fetcher,
        extractor,
        config,
        event_tx,
        cancel_token,
    } = ctx;

    // Wait for admission; bail out without fetching if the batch is
    // cancelled first. A closed gate means the same thing.
    let permit = tokio::select! {
        _ = cancel_token.cancelled() => {
            return fail(&event_tx, url, 0, TaskError::Cancelled);
        }
        acquired = gate.clone().acquire_owned() => match acquired {
            Ok(permit) => permit,
            Err(_) => return fail(&event_tx, url, 0, TaskError::Cancelled),
        },
    };

    event_tx
        .send(Event::TaskStarted { url: url.clone() })
        .ok();
    tracing::debug!(url = %url, "fetching");

    let attempts_future = {
        let fetcher = Arc::clone(&fetcher);
        let url = url.clone();
        let event_tx = event_tx.clone();
        let timeout = config.fetch.timeout_per_attempt;

        retry_with_backoff(
            BackoffPolicy::from(&config.retry),
            config.retry.max_attempts,
            config.retry.jitter,
            move |attempt| {
                if attempt > 1 {
                    event_tx
                        .send(Event::TaskRetrying {
                            url: url.clone(),
                            attempt,
                        })
                        .ok();
                }
                let fetcher = Arc::clone(&fetcher);
                let url = url.clone();
                async move { fetcher.fetch(&url, timeout).await }
            },
        )
    };

    // Racing the whole retry future against the token covers every
    // suspension point inside it: the fetch awaits and the backoff sleeps.
    let fetch_result = tokio::select! {
        _ = cancel_token.cancelled() => {
            drop(permit);
            return fail(&event_tx, url, 0, TaskError::Cancelled);
        }
        result = attempts_future => result,
    };

    let (page, attempts) = match fetch_result {
        Ok(success) => success,
        Err(retry_err) => {
            drop(permit);
            let attempts = retry_err.attempts;
            return fail(
                &event_tx,
                url,
                attempts,
                TaskError::Fetch {
                    attempts,
                    source: retry_err.source,
                },
            );
        }
    };

    // Admission is for network operations only
    drop(permit);

    match extractor.extract(&url, &page) {
        Ok(record) => {
            tracing::debug!(url = %url, attempts, "task succeeded");
            event_tx
                .send(Event::TaskSucceeded {
                    url: url.clone(),
                    attempts,
                })
                .ok();
            UrlOutcome::Success {
                url,
                record,
                attempts,
            }
        }
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "extraction failed");
            fail(&event_tx, url, attempts, TaskError::Extract(e))
        }
    }
}

fn fail<R>(
    event_tx: &broadcast::Sender<Event>,
    url: String,
    attempts: u32,
    error: TaskError,
) -> UrlOutcome<R> {
    event_tx
        .send(Event::TaskFailed {
            url: url.clone(),
            attempts,
            error: error.to_string(),
        })
        .ok();
    UrlOutcome::Failed {
        url,
        error,
        attempts,
    }
}

//! Background worker pool
//!
//! A bounded mpsc queue of article IDs feeds N worker tasks. Each worker
//! processes one job at a time, end-to-end; concurrency exists across jobs,
//! never within one. Retry is a queue concern layered on top of the
//! orchestrator's single-attempt, always-terminal `run` contract: only
//! `Unavailable` outcomes (store unreachable before any stage ran) are
//! retried, stage failures are terminal.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::pipeline::{Orchestrator, RunOutcome};

/// Bounded retry policy owned by the queue, not the orchestrator.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(60),
        }
    }
}

/// Handle for enqueueing article IDs
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<Uuid>,
}

impl JobQueue {
    /// Enqueue an article for background processing.
    ///
    /// Errors only when the worker pool has shut down.
    pub async fn enqueue(&self, article_id: Uuid) -> Result<(), crate::error::Error> {
        self.tx.send(article_id).await.map_err(|_| {
            crate::error::Error::Internal("job queue is closed".to_string())
        })
    }
}

/// Spawn the worker pool, returning the enqueue handle.
pub fn spawn_workers(
    orchestrator: Arc<Orchestrator>,
    workers: usize,
    retry: RetryPolicy,
    queue_capacity: usize,
) -> JobQueue {
    let (tx, rx) = mpsc::channel::<Uuid>(queue_capacity);
    let rx = Arc::new(tokio::sync::Mutex::new(rx));

    for worker_id in 0..workers.max(1) {
        let rx = Arc::clone(&rx);
        let orchestrator = Arc::clone(&orchestrator);
        let retry = retry.clone();

        tokio::spawn(async move {
            info!(worker_id, "Pipeline worker started");
            loop {
                let next = { rx.lock().await.recv().await };
                let Some(article_id) = next else {
                    info!(worker_id, "Job queue closed, worker stopping");
                    break;
                };
                process_job(&orchestrator, &retry, worker_id, article_id).await;
            }
        });
    }

    JobQueue { tx }
}

/// Run one job with retry on `Unavailable` and panic containment: the job
/// executes in its own task so a panic surfaces as a JoinError here instead
/// of killing the worker loop.
async fn process_job(
    orchestrator: &Arc<Orchestrator>,
    retry: &RetryPolicy,
    worker_id: usize,
    article_id: Uuid,
) {
    for attempt in 1..=retry.max_attempts {
        let task_orchestrator = Arc::clone(orchestrator);
        let join = tokio::spawn(async move { task_orchestrator.run(article_id).await }).await;

        match join {
            Ok(outcome) if outcome.is_retryable() => {
                if attempt < retry.max_attempts {
                    warn!(
                        worker_id,
                        article_id = %article_id,
                        attempt,
                        backoff_secs = retry.backoff.as_secs(),
                        "Store unavailable, retrying job"
                    );
                    tokio::time::sleep(retry.backoff).await;
                } else {
                    error!(
                        worker_id,
                        article_id = %article_id,
                        attempts = retry.max_attempts,
                        "Store unavailable, retries exhausted; job dropped"
                    );
                }
            }
            Ok(outcome) => {
                info!(worker_id, article_id = %article_id, outcome = ?outcome, "Job finished");
                return;
            }
            Err(join_error) => {
                // A panicked stage must not take the worker down or leave
                // the article without a recorded cause.
                error!(
                    worker_id,
                    article_id = %article_id,
                    error = %join_error,
                    "Job task panicked"
                );
                orchestrator
                    .record_failure(article_id, &format!("Internal processing fault: {}", join_error))
                    .await;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retry_policy_is_bounded() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff, Duration::from_secs(60));
    }
}

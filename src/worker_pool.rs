//! Bounded-concurrency executor for LLM-bound work items (§4.2, §5).
//!
//! An `Arc<AtomicBool>` cancellation handle wraps an `Arc`-shared, cheaply
//! cloned pool, generalized from "one long-running periodic task" to "N
//! independent one-shot work items bounded to W concurrent lanes".

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::OntologyError;
use crate::models::{ProgressCallback, ProgressEvent};

/// One unit of work submitted to the pool. `id` identifies the item for
/// error reporting and result lookup; it does not imply ordering.
#[async_trait]
pub trait WorkItem: Send + Sync + 'static {
    type Output: Send + 'static;

    fn id(&self) -> String;

    async fn execute(&self, cancel: &CancellationToken) -> Result<Self::Output, OntologyError>;
}

/// A scoped cancellation signal threaded through every operation (§5).
/// Cheaply cloned; observing `is_cancelled()` at cooperative checkpoints is
/// the caller's responsibility inside `execute`.
#[derive(Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), OntologyError> {
        if self.is_cancelled() { Err(OntologyError::Cancelled) } else { Ok(()) }
    }
}

/// The outcome of one work item: either its value or the error that failed
/// it. The pool never aborts the whole batch on a single item's failure.
pub struct ItemResult<T> {
    pub id: String,
    pub value: Result<T, OntologyError>,
}

/// Bounded-concurrency executor. One instance is typically shared across an
/// entire pipeline run (process-global degree W, §5).
pub struct WorkerPool {
    degree: usize,
}

impl WorkerPool {
    pub fn new(degree: usize) -> Self {
        Self { degree: degree.max(1) }
    }

    /// Runs every item in `items` over at most `self.degree` concurrent
    /// lanes, invoking `on_progress` after each completion and once more at
    /// the end with a summary. Results are returned in completion order,
    /// not submission order (§4.2, §5) — callers must look results up by
    /// `id`, not by position.
    pub async fn run<W>(
        &self,
        items: Vec<W>,
        cancel: CancellationToken,
        on_progress: Option<ProgressCallback>,
    ) -> Vec<ItemResult<W::Output>>
    where
        W: WorkItem,
    {
        let total = items.len();
        if total == 0 {
            if let Some(cb) = &on_progress {
                cb(ProgressEvent::new(0, 0, "nothing to do"));
            }
            return Vec::new();
        }
        if let Some(cb) = &on_progress {
            cb(ProgressEvent::new(0, total, format!("starting {total} item(s)")));
        }

        let semaphore = Arc::new(Semaphore::new(self.degree));
        let mut join_set: JoinSet<ItemResult<W::Output>> = JoinSet::new();

        for item in items {
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();
            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore not closed");
                let id = item.id();
                if let Err(e) = cancel.check() {
                    return ItemResult { id, value: Err(e) };
                }
                let value = item.execute(&cancel).await;
                ItemResult { id, value }
            });
        }

        let mut results = Vec::with_capacity(total);
        let mut completed = 0usize;
        while let Some(joined) = join_set.join_next().await {
            completed += 1;
            let result = match joined {
                Ok(r) => r,
                Err(join_err) => ItemResult {
                    id: "unknown".to_string(),
                    value: Err(OntologyError::Structural(format!(
                        "work item task panicked: {join_err}"
                    ))),
                },
            };
            if let Err(e) = &result.value {
                tracing::warn!(item_id = %result.id, error = %e, "work item failed");
            }
            if let Some(cb) = &on_progress {
                cb(ProgressEvent::new(completed, total, format!("completed {completed}/{total}")));
            }
            results.push(result);
        }

        if let Some(cb) = &on_progress {
            let failed = results.iter().filter(|r| r.value.is_err()).count();
            cb(ProgressEvent::new(
                total,
                total,
                format!("finished: {} ok, {failed} failed", total - failed),
            ));
        }

        results
    }
}

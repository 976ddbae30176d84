//! Async task runner.
//!
//! `TaskRunner` lets a single-threaded, UI-bound caller issue blocking
//! network operations without ever blocking itself. Each submitted operation
//! runs on a background Tokio runtime; its outcome is paired with the
//! caller's completion handler and queued on a bounded channel. The caller
//! drains that queue from its own loop via [`TaskRunner::poll_completions`],
//! so every handler executes on the originating thread, never on a worker.
//!
//! Concurrency is capped: when `max_in_flight` operations are already
//! running or awaiting delivery, further submissions are rejected with
//! [`SubmitError::Busy`] instead of queuing without bound.
//!
//! There is no cancellation: once submitted, an operation runs to completion
//! or failure, and the caller may only ignore the eventual outcome.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tokio::runtime::Runtime;
use tokio::sync::{Semaphore, TryAcquireError};

use crate::config::ClientConfig;
use crate::net::ClientError;

/// Identifier for a submitted task, monotonically increasing per runner.
///
/// Lets callers correlate completions with the submissions that produced
/// them and discard outcomes for views that have since been dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Submission failures. The runner itself never fails a running task.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// The in-flight cap is reached; try again once completions drain.
    #[error("Too many operations in flight - try again in a moment")]
    Busy,

    /// The runner is shutting down and accepts no further work.
    #[error("Task runner is shut down")]
    Shutdown,
}

/// A ready completion: the operation's outcome already bound to its handler.
type Completion = Box<dyn FnOnce() + Send>;

/// Runs network operations off the caller's thread and posts their outcomes
/// back for delivery on it.
///
/// The runner owns its runtime; dropping it shuts the runtime down in the
/// background, so a hung read can never block the owning thread.
///
/// # Example
///
/// ```ignore
/// let runner = TaskRunner::new(&config)?;
/// let client = MasterClient::new(&config);
///
/// runner.submit(
///     async move { client.nearby_stores(37.98, 23.73).await },
///     |outcome| match outcome {
///         Ok(stores) => render(stores),
///         Err(e) => show_error(&e),
///     },
/// )?;
///
/// // ... in the caller's own loop:
/// runner.poll_completions();
/// ```
pub struct TaskRunner {
    runtime: Option<Runtime>,
    done_tx: SyncSender<Completion>,
    done_rx: Receiver<Completion>,
    /// One permit per allowed in-flight operation. A task's permit travels
    /// inside its completion closure and is released only when the handler
    /// has run (or the completion is dropped), so the queue never overflows
    /// the channel bound.
    permits: Arc<Semaphore>,
    max_in_flight: usize,
    next_task_id: AtomicU64,
}

impl TaskRunner {
    /// Build a runner with its own background runtime.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("bitefinder-net")
            .enable_all()
            .build()?;

        let (done_tx, done_rx) = mpsc::sync_channel::<Completion>(config.max_in_flight);

        Ok(Self {
            runtime: Some(runtime),
            done_tx,
            done_rx,
            permits: Arc::new(Semaphore::new(config.max_in_flight)),
            max_in_flight: config.max_in_flight,
            next_task_id: AtomicU64::new(1),
        })
    }

    /// Submit an operation with a two-branch completion handler.
    ///
    /// The operation executes on the runtime's worker threads. Exactly one
    /// of the handler's branches (the `Ok` or `Err` arm of the outcome)
    /// fires, exactly once, and it fires on whichever thread calls
    /// [`poll_completions`](Self::poll_completions) - by contract the
    /// originating one. An operation that panics is reported to the error
    /// branch as [`ClientError::Aborted`]. Independently submitted tasks may
    /// complete in any order.
    pub fn submit<T, Fut, C>(&self, op: Fut, on_done: C) -> Result<TaskId, SubmitError>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
        C: FnOnce(Result<T, ClientError>) + Send + 'static,
    {
        let permit = match self.permits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(TryAcquireError::NoPermits) => return Err(SubmitError::Busy),
            Err(TryAcquireError::Closed) => return Err(SubmitError::Shutdown),
        };

        let runtime = self.runtime.as_ref().ok_or(SubmitError::Shutdown)?;
        let task_id = TaskId(self.next_task_id.fetch_add(1, Ordering::Relaxed));
        let done_tx = self.done_tx.clone();

        tracing::debug!(%task_id, "submitting operation");

        runtime.spawn(async move {
            // Inner spawn isolates a panicking operation: instead of the
            // panic crossing back into the caller, the abort is delivered to
            // the handler's error branch like any other failed outcome.
            let outcome = match tokio::spawn(op).await {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    let reason = match join_err.try_into_panic() {
                        Ok(panic) => panic
                            .downcast_ref::<&str>()
                            .map(|s| (*s).to_string())
                            .or_else(|| panic.downcast_ref::<String>().cloned())
                            .unwrap_or_else(|| "panicked with a non-string payload".into()),
                        Err(join_err) => join_err.to_string(),
                    };
                    tracing::error!(%task_id, "operation aborted: {}", reason);
                    Err(ClientError::Aborted(reason))
                }
            };

            let completion: Completion = Box::new(move || {
                let _permit = permit;
                on_done(outcome);
            });

            // send() cannot block: the channel bound equals the permit count
            // and each queued completion still holds its permit.
            if done_tx.send(completion).is_err() {
                tracing::debug!(%task_id, "runner dropped before completion delivery");
            }
        });

        Ok(task_id)
    }

    /// Drain ready completions, invoking each handler on the calling thread.
    ///
    /// Returns the number of handlers invoked. Never blocks; call it from
    /// the originating thread's own loop.
    pub fn poll_completions(&self) -> usize {
        let mut delivered = 0;
        while let Ok(completion) = self.done_rx.try_recv() {
            completion();
            delivered += 1;
        }
        delivered
    }

    /// Number of operations currently running or awaiting delivery.
    pub fn in_flight(&self) -> usize {
        self.max_in_flight
            .saturating_sub(self.permits.available_permits())
    }
}

impl Drop for TaskRunner {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            // Background shutdown: in-flight operations are abandoned rather
            // than joined, so a hung read never blocks the owning thread.
            runtime.shutdown_background();
        }
    }
}

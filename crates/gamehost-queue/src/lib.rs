//! Single-consumer task queue.
//!
//! Every change to the daemon's state happens inside a closure that the
//! event loop runs, one at a time. Anything running elsewhere (transport
//! callbacks, the console thread, boot sequences) gets a [`TaskSender`]
//! and submits closures; only the loop holding the [`TaskReceiver`] ever
//! touches the state. This is the same actor model a room task uses,
//! except the messages are closures instead of a command enum:
//!
//! ```text
//! transport thread ──submit──▶ ┌─────────┐
//! console thread ──call_blocking─▶│  queue  │──next_task──▶ event loop (&mut S)
//! boot task ─────submit──────▶ └─────────┘
//! ```
//!
//! A closure that panics is caught by [`execute`], logged, and the loop
//! carries on with the next one.

mod error;

pub use error::TaskError;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

/// A unit of work run against the loop's state.
pub type Task<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

/// Creates a connected sender/receiver pair. The queue is unbounded.
pub fn task_queue<S>() -> (TaskSender<S>, TaskReceiver<S>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (TaskSender { tx }, TaskReceiver { rx })
}

/// Submits work to the event loop. Cheap to clone; `Send + Sync`.
pub struct TaskSender<S> {
    tx: mpsc::UnboundedSender<Task<S>>,
}

// Derived Clone would require `S: Clone`.
impl<S> Clone for TaskSender<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<S> std::fmt::Debug for TaskSender<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSender")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl<S: 'static> TaskSender<S> {
    /// Queues `task` without waiting. Never blocks.
    pub fn submit<F>(&self, task: F) -> Result<(), TaskError>
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.tx.send(Box::new(task)).map_err(|_| TaskError::Closed)
    }

    fn submit_with_reply<F, R>(&self, task: F) -> Result<oneshot::Receiver<R>, TaskError>
    where
        F: FnOnce(&mut S) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.submit(move |state| {
            // The caller may have given up waiting; that is fine.
            let _ = reply_tx.send(task(state));
        })?;
        Ok(reply_rx)
    }

    /// Queues `task` and blocks the current thread until the loop has run
    /// it, returning its result.
    ///
    /// This is a rendezvous for plain threads such as a console reader.
    /// It must not be called from inside the async runtime.
    pub fn call_blocking<F, R>(&self, task: F) -> Result<R, TaskError>
    where
        F: FnOnce(&mut S) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit_with_reply(task)?
            .blocking_recv()
            .map_err(|_| TaskError::Dropped)
    }

    /// Async version of [`call_blocking`](Self::call_blocking).
    pub async fn call<F, R>(&self, task: F) -> Result<R, TaskError>
    where
        F: FnOnce(&mut S) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit_with_reply(task)?
            .await
            .map_err(|_| TaskError::Dropped)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// The consuming end, owned by the event loop.
pub struct TaskReceiver<S> {
    rx: mpsc::UnboundedReceiver<Task<S>>,
}

impl<S> std::fmt::Debug for TaskReceiver<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskReceiver")
            .field("queued", &self.rx.len())
            .finish()
    }
}

impl<S> TaskReceiver<S> {
    /// Waits up to `wait` for the next task.
    ///
    /// Returns `None` if nothing arrived in time. When every sender is
    /// gone this still waits the full `wait` before returning `None`, so
    /// a loop polling it keeps its cadence instead of spinning.
    pub async fn next_task(&mut self, wait: Duration) -> Option<Task<S>> {
        match tokio::time::timeout(wait, self.rx.recv()).await {
            Ok(Some(task)) => Some(task),
            Ok(None) => {
                tokio::time::sleep(wait).await;
                None
            }
            Err(_) => None,
        }
    }

    /// Takes a queued task without waiting.
    pub fn try_next(&mut self) -> Option<Task<S>> {
        self.rx.try_recv().ok()
    }

    /// Number of tasks waiting.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Runs `task` against `state`, containing any panic.
///
/// Returns `false` if the task panicked. The state may be left half
/// updated in that case; the reconciliation pass is what repairs it.
pub fn execute<S>(task: Task<S>, state: &mut S) -> bool {
    match catch_unwind(AssertUnwindSafe(|| task(state))) {
        Ok(()) => true,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(%reason, "task panicked");
            false
        }
    }
}

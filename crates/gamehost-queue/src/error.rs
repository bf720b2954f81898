/// Errors returned when handing work to the event loop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The receiving loop is gone; the task was not queued.
    #[error("task queue closed")]
    Closed,

    /// The task was queued but never replied (it panicked, or the loop
    /// stopped before running it).
    #[error("task dropped before replying")]
    Dropped,
}

use std::path::PathBuf;

use crate::WorkerState;

/// Errors that can occur in the session store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing a save file failed.
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A save file is not a JSON list, or a record failed to encode.
    #[error("malformed save data in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A worker was asked to make a transition its state machine forbids.
    #[error("worker {index} cannot go from {from} to {to}")]
    InvalidTransition {
        index: usize,
        from: WorkerState,
        to: WorkerState,
    },
}

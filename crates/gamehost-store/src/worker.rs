//! Worker slots and their state machine.

use std::fmt;

use gamehost_protocol::{SessionId, WorkerInstruction};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// The lifecycle state of a worker slot.
///
/// ```text
/// OFF → BOOT → RUN → OFF
///         ↘ OFF   ↘ SHUTDOWN → OFF
/// ```
///
/// - **Off**: idle, hosts nothing.
/// - **Boot**: a session was assigned and its boot sequence is running.
/// - **Run**: the session is live; the slot is probed for liveness.
/// - **Shutdown**: draining on request. Nothing in the normal lifecycle
///   enters it, but it survives a save/load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerState {
    #[default]
    Off,
    Boot,
    Run,
    Shutdown,
}

impl WorkerState {
    /// Returns `true` if transitioning to `target` is valid.
    ///
    /// Going back to `Off` is always allowed; it is how failures and
    /// clean ends are recovered.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Off, Self::Boot)
                | (Self::Boot, Self::Run)
                | (Self::Run, Self::Shutdown)
                | (_, Self::Off)
        )
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "OFF"),
            Self::Boot => write!(f, "BOOT"),
            Self::Run => write!(f, "RUN"),
            Self::Shutdown => write!(f, "SHUTDOWN"),
        }
    }
}

/// One slot of the fixed-size worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_game: Option<SessionId>,
    #[serde(default)]
    pub state: WorkerState,
    /// Instructions held back until the worker endpoint is reachable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_boot_messages: Vec<WorkerInstruction>,
}

impl Worker {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            current_game: None,
            state: WorkerState::Off,
            post_boot_messages: Vec::new(),
        }
    }

    /// Returns `true` if the slot can take a new session.
    pub fn is_free(&self) -> bool {
        self.current_game.is_none() && self.state == WorkerState::Off
    }

    fn transition(&mut self, to: WorkerState) -> Result<(), StoreError> {
        if !self.state.can_transition_to(to) {
            return Err(StoreError::InvalidTransition {
                index: self.index,
                from: self.state,
                to,
            });
        }
        tracing::info!(worker = self.index, from = %self.state, %to, "worker state change");
        self.state = to;
        Ok(())
    }

    /// OFF → BOOT, hosting `session`.
    pub fn begin_boot(&mut self, session: SessionId) -> Result<(), StoreError> {
        self.transition(WorkerState::Boot)?;
        self.current_game = Some(session);
        self.post_boot_messages.clear();
        Ok(())
    }

    /// BOOT → RUN.
    pub fn mark_running(&mut self) -> Result<(), StoreError> {
        self.transition(WorkerState::Run)
    }

    /// RUN → SHUTDOWN.
    pub fn request_shutdown(&mut self) -> Result<(), StoreError> {
        self.transition(WorkerState::Shutdown)
    }

    /// Back to OFF with no session and no deferred messages.
    pub fn reset(&mut self) {
        if self.state != WorkerState::Off {
            tracing::info!(worker = self.index, from = %self.state, "worker reset");
        }
        self.state = WorkerState::Off;
        self.current_game = None;
        self.post_boot_messages.clear();
    }
}

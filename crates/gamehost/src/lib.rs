//! # Gamehost
//!
//! Orchestrator for a fixed pool of game-hosting worker processes.
//!
//! Players ask the daemon, through chat commands relayed by the network,
//! to create a game session, invite others, pick a map and start. The
//! daemon assigns a free worker, runs its boot scripts, moves the players
//! over, and watches the worker until the game ends or the process dies.
//!
//! All state lives in one [`Engine`] owned by the [`Daemon`] loop. The
//! network and the console only ever hold a [`DaemonHandle`], which
//! enqueues closures for the loop to run one at a time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gamehost::prelude::*;
//! use gamehost_transport::MemoryTransport;
//!
//! # async fn demo() -> Result<(), GamehostError> {
//! let daemon = DaemonBuilder::new()
//!     .config(DaemonConfig::default())
//!     .build(Arc::new(MemoryTransport::new()), Arc::new(ScriptRunner::new("script")));
//! let handle = daemon.handle();
//! // hand `handle` to the transport callbacks, then:
//! daemon.run().await
//! # }
//! ```

mod config;
mod console;
mod engine;
mod error;
mod matchmaking;
mod pool;
mod process;
mod router;
mod server;
mod views;

pub use config::DaemonConfig;
pub use engine::{Engine, EngineTask};
pub use error::{CommandError, GamehostError};
pub use process::{ProcessError, ProcessRunner, ScriptRunner};
pub use server::{Daemon, DaemonBuilder, DaemonHandle};

pub mod prelude {
    pub use crate::{
        CommandError, Daemon, DaemonBuilder, DaemonConfig, DaemonHandle, Engine, GamehostError,
        ProcessError, ProcessRunner, ScriptRunner,
    };
    pub use gamehost_protocol::{ChatColor, ChatMessage, ChatRenderer, PlayerId, SessionId};
    pub use gamehost_transport::{OnlinePlayer, Transport};
}

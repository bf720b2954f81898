//! Control messages exchanged with workers and player proxies.
//!
//! Every payload is a flat JSON record. Messages to and from workers carry
//! an `action` string key; serde's "internally tagged" representation
//! (`#[serde(tag = "action")]`) maps that key straight onto an enum
//! variant:
//!
//! ```text
//! { "action": "game_end", "game": "…uuid…" }  →  InboundAction::GameEnd { game }
//! ```

use serde::{Deserialize, Serialize};

use crate::{PlayerId, SessionId};

/// Channel names used on the transport.
pub mod channel {
    /// Control traffic between the daemon and worker plugins.
    pub const MINIGAMES: &str = "minigames";
    /// Chat delivery to a single player, wherever they are connected.
    pub const PLAYER_MESSAGE: &str = "PLAYER_MESSAGE";
    /// "Move this player to that endpoint."
    pub const SEND_PLAYER_SERVER: &str = "SEND_PLAYER_SERVER";
}

// ---------------------------------------------------------------------------
// Inbound: worker → daemon
// ---------------------------------------------------------------------------

/// Messages a running worker sends to the daemon.
///
/// Fire-and-forget: the daemon acknowledges nothing. Extra keys in the
/// record (e.g. `from`) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum InboundAction {
    /// The worker removed a player from its live game.
    PlayerLeaveGame { player: PlayerId, game: SessionId },

    /// The worker admitted a player into its live game.
    GameAddPlayer { player: PlayerId, game: SessionId },

    /// The worker admitted a spectator into its live game.
    GameAddSpectator { player: PlayerId, game: SessionId },

    /// The game is over; the session can be discarded.
    GameEnd { game: SessionId },

    /// The live game reports back a single field of its configuration,
    /// e.g. the finalized map.
    GameConfig {
        game: SessionId,
        key: String,
        value: serde_json::Value,
    },
}

// ---------------------------------------------------------------------------
// Outbound: daemon → worker
// ---------------------------------------------------------------------------

/// Instructions the daemon forwards to the worker hosting a session.
///
/// These may be queued on the worker record while it is still booting,
/// so they are also part of the persisted worker format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WorkerInstruction {
    /// A player asked to join the live game.
    PlayerJoinGame { player: PlayerId, game: SessionId },

    /// A player asked to spectate the live game.
    PlayerSpectateGame { player: PlayerId, game: SessionId },

    /// A player quit; the worker gets the chance to kick them.
    PlayerLeaveGame { player: PlayerId, game: SessionId },
}

impl WorkerInstruction {
    /// The session this instruction concerns.
    pub fn game(&self) -> SessionId {
        match self {
            Self::PlayerJoinGame { game, .. }
            | Self::PlayerSpectateGame { game, .. }
            | Self::PlayerLeaveGame { game, .. } => *game,
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound: daemon → everyone
// ---------------------------------------------------------------------------

/// Broadcast on [`channel::SEND_PLAYER_SERVER`]: whichever proxy holds
/// `player` moves them to endpoint `server`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendPlayerServer {
    pub player: PlayerId,
    pub server: String,
}

/// Sent on [`channel::PLAYER_MESSAGE`]: display `chat` to `target`.
///
/// `chat` is whatever the [`ChatRenderer`](crate::ChatRenderer) produced;
/// the protocol layer treats it as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMessage {
    pub target: PlayerId,
    pub chat: serde_json::Value,
}

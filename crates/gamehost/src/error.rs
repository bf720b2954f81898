//! Error types for the gamehost engine.

use gamehost_catalog::CatalogError;
use gamehost_protocol::ProtocolError;
use gamehost_queue::TaskError;
use gamehost_store::StoreError;
use gamehost_transport::TransportError;

use crate::ProcessError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates a `From` impl, so
/// `?` converts errors from any layer into this one.
#[derive(Debug, thiserror::Error)]
pub enum GamehostError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// A player command that was refused.
///
/// The `Display` text is exactly what the player is shown. Handlers
/// return one of these before touching any state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Create a game first.")]
    NoCurrentGame,

    #[error("You are not in a game.")]
    NotInGame,

    #[error("You are already in a game.")]
    AlreadyInGame,

    #[error("You cannot modify this game.")]
    NotOwner,

    #[error("Game has already started.")]
    AlreadyStarted,

    #[error("Game is already public.")]
    AlreadyPublic,

    #[error("Game not found.")]
    GameNotFound,

    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("{0} is already in a game.")]
    TargetBusy(String),

    #[error("{0} is already invited.")]
    AlreadyInvited(String),

    #[error("You are not invited to this game.")]
    NotInvited,

    #[error("This game does not accept new players.")]
    JoinClosed,

    #[error("This game does not accept spectators.")]
    SpectateClosed,

    #[error("There is no open game to spectate.")]
    NothingToSpectate,

    #[error("Map not found: {0}")]
    UnknownMap(String),

    #[error("Mode not found: {0}")]
    UnknownMode(String),

    #[error("This game has no maps.")]
    NoMaps,

    #[error("You need at least {0} players to start.")]
    NotEnoughPlayers(usize),

    #[error("Servers are busy right now. Please try again later.")]
    NoFreeWorker,

    #[error("Unknown game: {0}")]
    UnknownGame(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::NotConnected("game0".into());
        let wrapped: GamehostError = err.into();
        assert!(matches!(wrapped, GamehostError::Transport(_)));
        assert!(wrapped.to_string().contains("game0"));
    }

    #[test]
    fn test_from_task_error() {
        let wrapped: GamehostError = TaskError::Closed.into();
        assert!(matches!(wrapped, GamehostError::Task(_)));
    }

    #[test]
    fn test_from_process_error() {
        let err = ProcessError::NonZeroExit {
            stage: "setup",
            code: Some(3),
        };
        let wrapped: GamehostError = err.into();
        assert!(matches!(wrapped, GamehostError::Process(_)));
        assert!(wrapped.to_string().contains("setup"));
    }

    #[test]
    fn test_command_error_display_is_refusal_text() {
        assert_eq!(
            CommandError::TargetBusy("bob".into()).to_string(),
            "bob is already in a game."
        );
        assert_eq!(
            CommandError::NotEnoughPlayers(2).to_string(),
            "You need at least 2 players to start."
        );
    }
}

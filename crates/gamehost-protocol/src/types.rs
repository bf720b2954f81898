//! Identity types shared by every layer.
//!
//! Players and sessions are both identified by UUIDs on the wire. We
//! wrap each in its own "newtype" so a `SessionId` can never be passed
//! where a `PlayerId` is expected, even though both are a `Uuid`
//! underneath.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// PlayerId
// ---------------------------------------------------------------------------

/// A stable, globally unique player identifier.
///
/// Assigned by the game network, never by the daemon. `#[serde(transparent)]`
/// makes it serialize as the bare UUID string, which is what the worker
/// plugins send and expect.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PlayerId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ProtocolError::InvalidId(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// The unique id of one game session.
///
/// Generated by the daemon when a session is created. Players type it
/// (or click a button carrying it) to join, spectate, or inspect a game,
/// so it must round-trip through its string form.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generates a fresh random session id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ProtocolError::InvalidId(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_string() {
        let id: PlayerId = "6f1c0a55-3e0d-4f58-9d3a-2f7f4b1c9e01".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"6f1c0a55-3e0d-4f58-9d3a-2f7f4b1c9e01\"");
    }

    #[test]
    fn test_player_id_from_str_rejects_garbage() {
        let result = "colorfall".parse::<PlayerId>();
        assert!(matches!(result, Err(ProtocolError::InvalidId(s)) if s == "colorfall"));
    }

    #[test]
    fn test_session_id_display_matches_parse() {
        let id = SessionId::generate();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_session_id_generate_is_unique() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }
}

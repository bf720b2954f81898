use gamehost_protocol::{PlayerId, SessionId};
use serde::{Deserialize, Serialize};

/// A player the daemon has interacted with.
///
/// `current_game`, when set, names a session that lists this player as a
/// member. The record is dropped once the player is in no game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "uuid")]
    pub id: PlayerId,
    /// Last known display name; best-effort.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_game: Option<SessionId>,
}

impl User {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            name: None,
            current_game: None,
        }
    }
}

//! Inbound control messages from workers.
//!
//! Every action is validated against the store and applied in one go.
//! Nothing is acknowledged; a message that does not apply is logged at
//! debug and dropped.

use gamehost_protocol::{ChatColor, ChatMessage, Codec, InboundAction, PlayerId, SessionId};
use gamehost_store::{GameSession, Selection};
use gamehost_transport::Transport;
use serde_json::Value;

use crate::{Engine, ProcessRunner};

impl<T: Transport, P: ProcessRunner> Engine<T, P> {
    /// Decodes and applies one message received on the control channel.
    pub fn route_message(&mut self, from: &str, data: &[u8]) {
        let action: InboundAction = match self.codec.decode(data) {
            Ok(action) => action,
            Err(e) => {
                tracing::debug!(from, error = %e, "ignoring unrecognized control message");
                return;
            }
        };
        tracing::debug!(from, ?action, "control message");

        match action {
            InboundAction::PlayerLeaveGame { player, game } => self.worker_removed_player(player, game),
            InboundAction::GameAddPlayer { player, game } => self.worker_added_player(player, game, false),
            InboundAction::GameAddSpectator { player, game } => {
                self.worker_added_player(player, game, true)
            }
            InboundAction::GameEnd { game } => self.end_session(game),
            InboundAction::GameConfig { game, key, value } => self.patch_session(game, &key, value),
        }
    }

    fn worker_removed_player(&mut self, player: PlayerId, game: SessionId) {
        if self.store.current_game(&player) != Some(game) {
            tracing::debug!(player_id = %player, session_id = %game, "leave for a game the player is not in");
            return;
        }
        self.store.clear_current_game(&player);
        if let Some(session) = self.store.session_mut(&game) {
            session.remove_member(&player);
        }
        tracing::info!(player_id = %player, session_id = %game, "player left live game");
    }

    fn worker_added_player(&mut self, player: PlayerId, game: SessionId, spectate: bool) {
        if self.store.current_game(&player).is_some() {
            self.notify(player, &ChatMessage::colored(ChatColor::Red, "You are already in a game."));
            return;
        }
        let Some(session) = self.store.session_mut(&game) else {
            self.notify(player, &ChatMessage::colored(ChatColor::Red, "Game not found."));
            return;
        };
        if spectate {
            session.add_spectator(player);
        } else {
            session.add_member(player);
        }
        let host = session.server_id.index();
        self.store.set_current_game(player, game);
        tracing::info!(player_id = %player, session_id = %game, spectate, "worker admitted player");
        if let Some(index) = host {
            self.move_player(player, index);
        }
    }

    /// Deletes `game`, releases its members and resets its worker.
    pub(crate) fn end_session(&mut self, game: SessionId) {
        self.store.release_workers_of(&game);
        let Some(session) = self.store.remove_session(&game) else {
            tracing::debug!(session_id = %game, "end for unknown game");
            return;
        };
        for member in &session.members {
            if self.store.current_game(member) == Some(game) {
                self.store.clear_current_game(member);
            }
        }
        tracing::info!(session_id = %game, "session ended");
    }

    fn patch_session(&mut self, game: SessionId, key: &str, value: Value) {
        let Some(session) = self.store.session_mut(&game) else {
            tracing::debug!(session_id = %game, key, "config for unknown game");
            return;
        };
        match apply_config(session, key, value) {
            Ok(()) => tracing::debug!(session_id = %game, key, "session config updated"),
            Err(reason) => tracing::debug!(session_id = %game, key, reason, "session config ignored"),
        }
    }
}

/// Applies a single-field patch reported by a live session.
fn apply_config(session: &mut GameSession, key: &str, value: Value) -> Result<(), &'static str> {
    fn flag(value: &Value) -> Result<bool, &'static str> {
        value.as_bool().ok_or("expected a boolean")
    }
    fn text(value: Value) -> Result<String, &'static str> {
        match value {
            Value::String(s) => Ok(s),
            _ => Err("expected a string"),
        }
    }
    fn selection(value: Value) -> Result<Selection, &'static str> {
        match value {
            Value::Null => Ok(Selection::RandomAtBoot),
            Value::String(s) => Ok(Selection::Chosen(s)),
            _ => Err("expected a string or null"),
        }
    }

    match key {
        "map_id" => session.map_id = selection(value)?,
        "play_mode" => session.play_mode = selection(value)?,
        "public" => session.public = flag(&value)?,
        "players_may_join" => session.players_may_join = flag(&value)?,
        "players_may_spectate" => session.players_may_spectate = flag(&value)?,
        "debug" => session.debug = flag(&value)?,
        "display_name" => session.display_name = text(value)?,
        "description" => session.description = text(value)?,
        _ => return Err("unknown key"),
    }
    Ok(())
}

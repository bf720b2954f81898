//! The `/game` command surface: creating, inviting, joining, starting.
//!
//! The first argument is either a sub-command (`invite`, `public`, `map`,
//! `mode`, `quit`/`leave`, `start`), a template name or shorthand, or a
//! session id. Templates are tried before ids, and a token that is not a
//! valid id is simply an unknown game.
//!
//! Handlers check everything up front and return a [`CommandError`]
//! before touching any state; the dispatcher shows it to the player.

use gamehost_catalog::GameTemplate;
use gamehost_protocol::{ChatColor, ChatMessage, PlayerId, SessionId, WorkerInstruction};
use gamehost_store::{GameSession, Selection, SessionStage};
use gamehost_transport::{OnlinePlayer, Transport};

use crate::views::InfoView;
use crate::{CommandError, Engine, ProcessRunner};

impl<T: Transport, P: ProcessRunner> Engine<T, P> {
    /// Runs one `/game` command from `sender`, who is connected to
    /// endpoint `server`. `args` excludes the leading `game` token.
    pub fn player_command(&mut self, sender: &OnlinePlayer, server: &str, args: &[String]) {
        let rest = args.get(1..).unwrap_or_default();
        let result = match args.first().map(String::as_str) {
            None => {
                self.show_default(sender, server);
                Ok(())
            }
            Some("invite") => self.invite(sender, server, rest),
            Some("public") => self.make_public(sender, server),
            Some("map") => self.select_map(sender, server, rest),
            Some("mode") => self.select_mode(sender, server, rest),
            Some("quit" | "leave") => self.quit(sender, server),
            Some("start") => self.start(sender, server),
            Some(token) => self.target_command(sender, server, token, rest),
        };
        if let Err(refusal) = result {
            tracing::debug!(player_id = %sender.id, ?args, %refusal, "command refused");
            self.send_chat(
                sender.id,
                Some(server),
                &ChatMessage::colored(ChatColor::Red, refusal.to_string()),
            );
        }
    }

    fn show_info(&mut self, viewer: PlayerId, server: &str, id: SessionId, view: InfoView) {
        if let Some(session) = self.store.session(&id).cloned() {
            let lines = self.session_info(viewer, &session, view);
            self.send_lines(viewer, Some(server), &lines);
        }
    }

    fn show_default(&mut self, sender: &OnlinePlayer, server: &str) {
        if let Some(id) = self.store.current_game(&sender.id) {
            if self.store.session(&id).is_some() {
                self.show_info(sender.id, server, id, InfoView::Setup);
                return;
            }
            self.store.clear_current_game(&sender.id);
        }
        let lines = self.games_menu(sender.id);
        self.send_lines(sender.id, Some(server), &lines);
    }

    /// The caller's own session, if they own it.
    fn owned_session(&self, player: &PlayerId) -> Result<&GameSession, CommandError> {
        let id = self
            .store
            .current_game(player)
            .ok_or(CommandError::NoCurrentGame)?;
        let session = self.store.session(&id).ok_or(CommandError::NoCurrentGame)?;
        if !session.is_owner(player) {
            return Err(CommandError::NotOwner);
        }
        Ok(session)
    }

    /// The caller's own session, if they own it and it has not started.
    fn owned_pending_session(&self, player: &PlayerId) -> Result<SessionId, CommandError> {
        let session = self.owned_session(player)?;
        if !session.is_pending() {
            return Err(CommandError::AlreadyStarted);
        }
        Ok(session.unique_id)
    }

    // -----------------------------------------------------------------------
    // Owner commands
    // -----------------------------------------------------------------------

    fn invite(&mut self, sender: &OnlinePlayer, server: &str, rest: &[String]) -> Result<(), CommandError> {
        let id = self.owned_pending_session(&sender.id)?;
        let name = match rest {
            [] => {
                self.show_info(sender.id, server, id, InfoView::Invite);
                return Ok(());
            }
            [name] => name,
            _ => return Err(CommandError::Usage("/game invite [player]")),
        };

        let invitee = self
            .online_by_name(name)
            .ok_or_else(|| CommandError::PlayerNotFound(name.clone()))?;
        if self.store.current_game(&invitee.id).is_some() {
            return Err(CommandError::TargetBusy(invitee.name));
        }
        let Some(session) = self.store.session(&id) else {
            return Err(CommandError::NoCurrentGame);
        };
        if session.is_invited(&invitee.id) {
            return Err(CommandError::AlreadyInvited(invitee.name));
        }
        let display_name = session.display_name.clone();

        if let Some(session) = self.store.session_mut(&id) {
            session.invite(invitee.id);
        }
        tracing::info!(session_id = %id, player_id = %invitee.id, "player invited");
        self.notify(
            invitee.id,
            &ChatMessage::new()
                .text(format!("{} invited you to a game of {}. ", sender.name, display_name))
                .button(ChatColor::Green, "[Accept]", format!("/game {id} join"), "Accept the game invite")
                .text(" ")
                .button(ChatColor::Yellow, "[Info]", format!("/game {id} info"), "Read more"),
        );
        self.send_chat(
            sender.id,
            Some(server),
            &ChatMessage::colored(ChatColor::Green, format!("Invited {} to this game.", invitee.name)),
        );
        Ok(())
    }

    fn make_public(&mut self, sender: &OnlinePlayer, server: &str) -> Result<(), CommandError> {
        let id = self.owned_pending_session(&sender.id)?;
        let Some(session) = self.store.session_mut(&id) else {
            return Err(CommandError::NoCurrentGame);
        };
        if session.public {
            return Err(CommandError::AlreadyPublic);
        }
        session.public = true;
        let display_name = session.display_name.clone();
        tracing::info!(session_id = %id, "session made public");
        self.show_info(sender.id, server, id, InfoView::Setup);

        let announcement = ChatMessage::new()
            .text(format!("{} opened a game of {}. ", sender.name, display_name))
            .button(ChatColor::Green, "[Join]", format!("/game {id} join"), "Join this game.")
            .text(" ")
            .button(ChatColor::Yellow, "[Info]", format!("/game {id} info"), "Read more");
        for player in self.transport.online_players() {
            if player.id != sender.id && self.store.current_game(&player.id).is_none() {
                self.notify(player.id, &announcement);
            }
        }
        Ok(())
    }

    fn select_map(&mut self, sender: &OnlinePlayer, server: &str, rest: &[String]) -> Result<(), CommandError> {
        let id = self.owned_pending_session(&sender.id)?;
        if rest.is_empty() {
            self.show_info(sender.id, server, id, InfoView::Map);
            return Ok(());
        }
        let map_id = rest.join(" ");
        let game = self.store.session(&id).map(|s| s.name.clone()).unwrap_or_default();
        if self.catalog.find_world(&game, &map_id).is_none() {
            return Err(CommandError::UnknownMap(map_id));
        }
        if let Some(session) = self.store.session_mut(&id) {
            session.map_id = Selection::Chosen(map_id);
        }
        self.show_info(sender.id, server, id, InfoView::Setup);
        Ok(())
    }

    fn select_mode(&mut self, sender: &OnlinePlayer, server: &str, rest: &[String]) -> Result<(), CommandError> {
        let id = self.owned_pending_session(&sender.id)?;
        if rest.is_empty() {
            self.show_info(sender.id, server, id, InfoView::Mode);
            return Ok(());
        }
        let mode_id = rest.join(" ");
        let game = self.store.session(&id).map(|s| s.name.clone()).unwrap_or_default();
        if self.catalog.find_mode(&game, &mode_id).is_none() {
            return Err(CommandError::UnknownMode(mode_id));
        }
        if let Some(session) = self.store.session_mut(&id) {
            session.play_mode = Selection::Chosen(mode_id);
        }
        self.show_info(sender.id, server, id, InfoView::Setup);
        Ok(())
    }

    fn start(&mut self, sender: &OnlinePlayer, server: &str) -> Result<(), CommandError> {
        let session = self.owned_session(&sender.id)?;
        if !session.is_pending() {
            return Err(CommandError::AlreadyStarted);
        }
        if session.members.len() < session.min_players {
            return Err(CommandError::NotEnoughPlayers(session.min_players));
        }
        let (id, game) = (session.unique_id, session.name.clone());
        if self.catalog.worlds_for(&game).is_empty() {
            return Err(CommandError::NoMaps);
        }
        let worker = self.store.free_worker().ok_or(CommandError::NoFreeWorker)?;

        match self.start_session(id, worker) {
            Ok(true) => {
                self.send_chat(
                    sender.id,
                    Some(server),
                    &ChatMessage::colored(ChatColor::White, "Get ready. Your game will start momentarily."),
                );
                Ok(())
            }
            Ok(false) => Err(CommandError::NoMaps),
            Err(e) => {
                tracing::error!(session_id = %id, worker, error = %e, "could not assign worker");
                Err(CommandError::NoFreeWorker)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Leaving
    // -----------------------------------------------------------------------

    fn quit(&mut self, sender: &OnlinePlayer, server: &str) -> Result<(), CommandError> {
        let id = self
            .store
            .current_game(&sender.id)
            .ok_or(CommandError::NotInGame)?;
        self.store.clear_current_game(&sender.id);
        let Some(session) = self.store.session_mut(&id) else {
            return Ok(());
        };
        session.remove_member(&sender.id);
        let session = session.clone();
        tracing::info!(session_id = %id, player_id = %sender.id, "player quit");

        match session.server_id.index() {
            None if session.is_owner(&sender.id) => {
                let cancelled =
                    ChatMessage::colored(ChatColor::Red, format!("{} cancelled the game.", sender.name));
                for member in &session.members {
                    if self.store.current_game(member) == Some(id) {
                        self.store.clear_current_game(member);
                    }
                    self.notify(*member, &cancelled);
                }
                self.store.remove_session(&id);
            }
            None => {
                let left = ChatMessage::colored(ChatColor::White, format!("{} left the game.", sender.name));
                for member in &session.members {
                    self.notify(*member, &left);
                }
            }
            Some(index) => {
                // The worker gets the chance to kick the player from the
                // live game; it reports back with player_leave_game.
                self.send_to_worker(
                    index,
                    WorkerInstruction::PlayerLeaveGame {
                        player: sender.id,
                        game: id,
                    },
                );
            }
        }
        self.send_chat(
            sender.id,
            Some(server),
            &ChatMessage::colored(ChatColor::White, "You left the game."),
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Template or session targets
    // -----------------------------------------------------------------------

    fn target_command(
        &mut self,
        sender: &OnlinePlayer,
        server: &str,
        token: &str,
        rest: &[String],
    ) -> Result<(), CommandError> {
        let sub = match rest {
            [] => None,
            [sub] => Some(sub.as_str()),
            _ => return Err(CommandError::Usage("/game <game> [create|join|spectate|info]")),
        };

        if let Some(template) = self.catalog.find_template(token) {
            return match sub {
                None | Some("info") => {
                    let lines = self.template_overview(&template);
                    self.send_lines(sender.id, Some(server), &lines);
                    Ok(())
                }
                Some("create") => self.create(sender, server, &template),
                Some("join" | "j") => self.join_template(sender, server, &template, false),
                Some("spectate" | "spec") => self.join_template(sender, server, &template, true),
                Some(_) => Err(CommandError::Usage("/game <game> [create|join|spectate|info]")),
            };
        }

        let id: SessionId = token
            .parse()
            .map_err(|_| CommandError::UnknownGame(token.to_string()))?;
        match sub {
            None | Some("info") => self.info(sender, server, id),
            Some("join" | "j") => self.join(sender, server, id, false),
            Some("spectate" | "spec") => self.join(sender, server, id, true),
            Some(_) => Err(CommandError::Usage("/game <id> [join|spectate|info]")),
        }
    }

    fn info(&mut self, sender: &OnlinePlayer, server: &str, id: SessionId) -> Result<(), CommandError> {
        let visible = self
            .store
            .session(&id)
            .is_some_and(|s| s.is_visible_to(&sender.id));
        if !visible {
            return Err(CommandError::GameNotFound);
        }
        self.show_info(sender.id, server, id, InfoView::Setup);
        Ok(())
    }

    fn create(&mut self, sender: &OnlinePlayer, server: &str, template: &GameTemplate) -> Result<(), CommandError> {
        if self.store.current_game(&sender.id).is_some() {
            return Err(CommandError::AlreadyInGame);
        }
        let session = GameSession::from_template(template, SessionId::generate(), sender.id);
        let id = session.unique_id;
        self.store.insert_session(session);
        self.store.get_or_create_user(sender.id, Some(&sender.name));
        self.store.set_current_game(sender.id, id);
        tracing::info!(session_id = %id, player_id = %sender.id, game = %template.name, "session created");
        self.show_info(sender.id, server, id, InfoView::Setup);
        Ok(())
    }

    /// Joins the first matching session of `template`, or creates one.
    fn join_template(
        &mut self,
        sender: &OnlinePlayer,
        server: &str,
        template: &GameTemplate,
        spectate: bool,
    ) -> Result<(), CommandError> {
        if self.store.current_game(&sender.id).is_some() {
            return Err(CommandError::AlreadyInGame);
        }
        let found = self
            .store
            .sessions()
            .filter(|s| s.name == template.name && s.is_eligible(&sender.id))
            .find(|s| {
                if spectate {
                    s.players_may_spectate
                } else {
                    s.players_may_join && s.is_pending()
                }
            })
            .map(|s| s.unique_id);
        match found {
            Some(id) => self.join(sender, server, id, spectate),
            None if spectate => Err(CommandError::NothingToSpectate),
            None => self.create(sender, server, template),
        }
    }

    /// Joins or spectates session `id`.
    ///
    /// A Pending session admits the caller directly. A live one is asked
    /// through its worker, which answers with `game_add_player`.
    fn join(&mut self, sender: &OnlinePlayer, server: &str, id: SessionId, spectate: bool) -> Result<(), CommandError> {
        if self.store.current_game(&sender.id).is_some() {
            return Err(CommandError::AlreadyInGame);
        }
        let session = self.store.session(&id).ok_or(CommandError::GameNotFound)?;
        if !session.is_eligible(&sender.id) {
            return Err(if session.is_visible_to(&sender.id) {
                CommandError::NotInvited
            } else {
                CommandError::GameNotFound
            });
        }
        if spectate && !session.players_may_spectate {
            return Err(CommandError::SpectateClosed);
        }
        if !spectate && !session.players_may_join {
            return Err(CommandError::JoinClosed);
        }

        match self.store.stage_of(session) {
            SessionStage::Pending => {
                self.admit(sender, server, id, spectate);
                Ok(())
            }
            SessionStage::Booting | SessionStage::Running => {
                let Some(index) = session.server_id.index() else {
                    return Err(CommandError::GameNotFound);
                };
                let instruction = if spectate {
                    WorkerInstruction::PlayerSpectateGame {
                        player: sender.id,
                        game: id,
                    }
                } else {
                    WorkerInstruction::PlayerJoinGame {
                        player: sender.id,
                        game: id,
                    }
                };
                self.send_to_worker(index, instruction);
                self.send_chat(
                    sender.id,
                    Some(server),
                    &ChatMessage::colored(ChatColor::White, "Joining game..."),
                );
                Ok(())
            }
        }
    }

    fn admit(&mut self, sender: &OnlinePlayer, server: &str, id: SessionId, spectate: bool) {
        let Some(session) = self.store.session_mut(&id) else {
            return;
        };
        if spectate {
            session.add_spectator(sender.id);
        } else {
            session.add_member(sender.id);
        }
        let others: Vec<PlayerId> = session
            .members
            .iter()
            .filter(|m| **m != sender.id)
            .copied()
            .collect();
        self.store.get_or_create_user(sender.id, Some(&sender.name));
        self.store.set_current_game(sender.id, id);
        tracing::info!(session_id = %id, player_id = %sender.id, spectate, "player joined");

        self.show_info(sender.id, server, id, InfoView::Setup);
        let joined = ChatMessage::colored(ChatColor::White, format!("{} has joined your game.", sender.name));
        for member in others {
            self.notify(member, &joined);
        }
    }
}

//! Player-facing views: session info screens and the games menu.
//!
//! Views only build [`ChatMessage`] lines; what they look like on screen
//! is up to the [`ChatRenderer`](gamehost_protocol::ChatRenderer).

use gamehost_catalog::{GameTemplate, PlayMode, WorldInfo};
use gamehost_protocol::{ChatColor, ChatMessage, PlayerId};
use gamehost_store::GameSession;
use gamehost_transport::Transport;
use rand::seq::SliceRandom;

use crate::{Engine, ProcessRunner};

const TOOLTIP_WIDTH: usize = 24;

const MENU_COLORS: [ChatColor; 5] = [
    ChatColor::Blue,
    ChatColor::Green,
    ChatColor::Gold,
    ChatColor::Aqua,
    ChatColor::LightPurple,
];

const CHOICE_COLORS: [ChatColor; 4] = [
    ChatColor::Blue,
    ChatColor::Green,
    ChatColor::Gold,
    ChatColor::Aqua,
];

/// Which variant of the session screen to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InfoView {
    /// Members, settings and the owner's controls.
    Setup,
    /// Setup plus the list of selectable maps.
    Map,
    /// Setup plus the list of selectable play modes.
    Mode,
    /// Setup plus the players that can be invited.
    Invite,
}

/// Greedy word wrap used for tooltips.
pub(crate) fn wrap_words(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut line_len = 0;
    for word in text.split_whitespace() {
        if line_len == 0 {
            line_len = word.len();
        } else if line_len + 1 + word.len() <= width {
            out.push(' ');
            line_len += 1 + word.len();
        } else {
            out.push('\n');
            line_len = word.len();
        }
        out.push_str(word);
    }
    out
}

fn world_tooltip(world: &WorldInfo) -> String {
    let mut tooltip = world.display_name.clone();
    if !world.authors.is_empty() {
        tooltip.push_str("\nMade by: ");
        tooltip.push_str(&world.authors.join(" "));
    }
    let description = wrap_words(&world.description, TOOLTIP_WIDTH);
    if !description.is_empty() {
        tooltip.push('\n');
        tooltip.push_str(&description);
    }
    tooltip
}

fn mode_tooltip(mode: &PlayMode) -> String {
    let description = wrap_words(&mode.description, TOOLTIP_WIDTH);
    if description.is_empty() {
        mode.display_name.clone()
    } else {
        format!("{}\n{}", mode.display_name, description)
    }
}

fn header(title: String) -> ChatMessage {
    ChatMessage::colored(ChatColor::Blue, "> ").color(ChatColor::Green, title)
}

fn line() -> ChatMessage {
    ChatMessage::colored(ChatColor::Blue, "> ")
}

impl<T: Transport, P: ProcessRunner> Engine<T, P> {
    pub(crate) fn send_lines(&self, target: PlayerId, server: Option<&str>, lines: &[ChatMessage]) {
        for msg in lines {
            self.send_chat(target, server, msg);
        }
    }

    /// The session screen as seen by `viewer`.
    pub(crate) fn session_info(
        &mut self,
        viewer: PlayerId,
        session: &GameSession,
        view: InfoView,
    ) -> Vec<ChatMessage> {
        let pending = session.is_pending();
        let can_modify = pending && session.is_owner(&viewer);
        let title = if pending { "Game Setup" } else { "Game Info" };
        let mut lines = vec![
            header(format!("{} {}", session.display_name, title)),
            line().color(ChatColor::Gray, session.description.clone()),
        ];

        let names: Vec<String> = session
            .members
            .iter()
            .map(|m| self.player_name(m))
            .collect();
        lines.push(
            line()
                .color(ChatColor::White, "Players ")
                .color(ChatColor::Gold, names.join(" ")),
        );
        if !session.spectators.is_empty() {
            let spectators: Vec<String> = session
                .spectators
                .iter()
                .map(|m| self.player_name(m))
                .collect();
            lines.push(
                line()
                    .color(ChatColor::White, "Spectators ")
                    .color(ChatColor::Gray, spectators.join(" ")),
            );
        }
        if session.public {
            lines.push(line().color(ChatColor::Blue, "Public Game"));
        } else if can_modify {
            lines.push(
                line()
                    .button(ChatColor::Green, "[Invite]", "/game invite", "Invite a player to your game.")
                    .text(" ")
                    .button(ChatColor::Blue, "[Public]", "/game public", "Invite everyone and allow them to join."),
            );
        }

        if view == InfoView::Invite {
            let mut invite = line();
            for player in self.transport.online_players() {
                if player.id == viewer || self.store.current_game(&player.id).is_some() {
                    continue;
                }
                invite = invite.text(" ").button(
                    ChatColor::Green,
                    player.name.clone(),
                    format!("/game invite {}", player.name),
                    format!("Invite {}", player.name),
                );
            }
            lines.push(invite);
        }

        if view == InfoView::Map {
            let mut choices = line().color(ChatColor::White, "Select a map:");
            for (i, world) in self.catalog.worlds_for(&session.name).iter().enumerate() {
                choices = choices.text("  ").button(
                    CHOICE_COLORS[(i + 1) % CHOICE_COLORS.len()],
                    world.display_name.clone(),
                    format!("/game map {}", world.map_id),
                    world_tooltip(world),
                );
            }
            lines.push(choices);
        } else {
            let current = session
                .map_id
                .chosen()
                .and_then(|id| self.catalog.find_world(&session.name, id));
            let mut map_line = line().color(ChatColor::White, "Map ");
            map_line = match current {
                Some(world) => map_line.hover(ChatColor::Gray, world.display_name.clone(), world_tooltip(&world)),
                None => map_line.color(ChatColor::Gray, "Random"),
            };
            if can_modify {
                map_line = map_line
                    .text(" ")
                    .button(ChatColor::Aqua, "[Select]", "/game map", "Select a map.");
            }
            lines.push(map_line);
        }

        let modes = self.catalog.modes_for(&session.name);
        if view == InfoView::Mode {
            let mut choices = line().color(ChatColor::White, "Select a mode:");
            for (i, mode) in modes.iter().enumerate() {
                choices = choices.text("  ").button(
                    CHOICE_COLORS[(i + 1) % CHOICE_COLORS.len()],
                    mode.display_name.clone(),
                    format!("/game mode {}", mode.mode_id),
                    mode_tooltip(mode),
                );
            }
            lines.push(choices);
        } else if !modes.is_empty() {
            let current = session
                .play_mode
                .chosen()
                .and_then(|id| modes.iter().find(|m| m.mode_id == id));
            let mut mode_line = line().color(ChatColor::White, "Mode ");
            mode_line = match current {
                Some(mode) => mode_line.hover(ChatColor::Gray, mode.display_name.clone(), mode_tooltip(mode)),
                None => mode_line.color(ChatColor::Gray, "Random"),
            };
            if can_modify {
                mode_line = mode_line
                    .text(" ")
                    .button(ChatColor::Aqua, "[Select]", "/game mode", "Select a play mode.");
            }
            lines.push(mode_line);
        }

        if can_modify {
            lines.push(
                line()
                    .color(ChatColor::White, "Ready? ")
                    .button(ChatColor::Green, "[Go!]", "/game start", "Start the game")
                    .text(" ")
                    .button(ChatColor::Red, "[Cancel]", "/game quit", "Cancel this game"),
            );
        } else if session.is_member(&viewer) {
            lines.push(
                line()
                    .color(ChatColor::White, "Changed your mind? ")
                    .button(ChatColor::Red, "[Quit]", "/game quit", "Leave this game"),
            );
        } else {
            lines.push(
                line()
                    .color(ChatColor::White, "Join us? ")
                    .button(
                        ChatColor::Green,
                        "[Join]",
                        format!("/game {} join", session.unique_id),
                        "Join this game",
                    ),
            );
        }
        lines
    }

    /// The read-only screen of a template, with a "create" button.
    pub(crate) fn template_overview(&self, template: &GameTemplate) -> Vec<ChatMessage> {
        vec![
            header(format!("{} Game Info", template.display_name)),
            line().color(ChatColor::Gray, template.description.clone()),
            line()
                .color(ChatColor::White, "Wanna play? ")
                .button(
                    ChatColor::Green,
                    "[Create]",
                    format!("/game {} create", template.name),
                    "Create a game",
                ),
        ]
    }

    /// Open sessions visible to `viewer`, then every template.
    pub(crate) fn games_menu(&mut self, viewer: PlayerId) -> Vec<ChatMessage> {
        let mut lines = vec![header("Games Menu".to_string())];

        let visible: Vec<GameSession> = self
            .store
            .sessions()
            .filter(|s| s.is_visible_to(&viewer))
            .cloned()
            .collect();
        if !visible.is_empty() {
            let mut open = line().color(ChatColor::White, "Open Games");
            for session in &visible {
                let mut tooltip = session.display_name.clone();
                for member in &session.members {
                    tooltip.push('\n');
                    tooltip.push_str(&self.player_name(member));
                }
                open = open.text(" ").button(
                    ChatColor::Green,
                    format!("[{}]", session.display_name),
                    format!("/game {} info", session.unique_id),
                    tooltip,
                );
            }
            lines.push(open);
        }

        let mut colors = MENU_COLORS;
        colors.shuffle(&mut self.rng);
        let templates = self.catalog.templates().to_vec();
        for (i, template) in templates.iter().enumerate() {
            lines.push(line().button(
                colors[(i + 1) % colors.len()],
                format!("[{}] {}", template.shorthand.to_uppercase(), template.display_name),
                format!("/game {}", template.name),
                template.display_name.clone(),
            ));
        }
        lines
    }
}

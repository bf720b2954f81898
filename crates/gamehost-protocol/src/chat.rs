//! Chat intents and the renderer seam.
//!
//! The engine describes *what* it wants to tell a player as a
//! [`ChatMessage`]: plain text, coloured text, and clickable buttons that
//! run a command and show a tooltip. A [`ChatRenderer`] turns that
//! intent into the opaque payload the player's client understands. The
//! engine never builds client payloads by hand.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Named text colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatColor {
    White,
    Gray,
    Red,
    Green,
    Yellow,
    Gold,
    Blue,
    Aqua,
    LightPurple,
}

impl ChatColor {
    /// The lowercase name used in rendered payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Gray => "gray",
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Gold => "gold",
            Self::Blue => "blue",
            Self::Aqua => "aqua",
            Self::LightPurple => "light_purple",
        }
    }
}

/// One piece of a chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatSpan {
    /// Text in the client's default style.
    Text(String),
    /// Text in a given colour.
    Colored { color: ChatColor, text: String },
    /// Clickable text. `command` runs on click, `tooltip` shows on hover.
    Button {
        color: ChatColor,
        text: String,
        command: Option<String>,
        tooltip: Option<String>,
    },
}

/// A single chat line built from spans.
///
/// Built with chained calls:
///
/// ```rust
/// use gamehost_protocol::{ChatColor, ChatMessage};
///
/// let line = ChatMessage::new()
///     .text("Alice invited you. ")
///     .button(ChatColor::Green, "[Accept]", "/game 42 join", "Accept the invite");
/// assert_eq!(line.plain_text(), "Alice invited you. [Accept]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatMessage {
    spans: Vec<ChatSpan>,
}

impl ChatMessage {
    /// An empty line.
    pub fn new() -> Self {
        Self::default()
    }

    /// A line consisting of one coloured span.
    pub fn colored(color: ChatColor, text: impl Into<String>) -> Self {
        Self::new().color(color, text)
    }

    /// Appends plain text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.spans.push(ChatSpan::Text(text.into()));
        self
    }

    /// Appends coloured text.
    pub fn color(mut self, color: ChatColor, text: impl Into<String>) -> Self {
        self.spans.push(ChatSpan::Colored {
            color,
            text: text.into(),
        });
        self
    }

    /// Appends a clickable button.
    pub fn button(
        mut self,
        color: ChatColor,
        text: impl Into<String>,
        command: impl Into<String>,
        tooltip: impl Into<String>,
    ) -> Self {
        self.spans.push(ChatSpan::Button {
            color,
            text: text.into(),
            command: Some(command.into()),
            tooltip: Some(tooltip.into()),
        });
        self
    }

    /// Appends a non-clickable span with a tooltip.
    pub fn hover(
        mut self,
        color: ChatColor,
        text: impl Into<String>,
        tooltip: impl Into<String>,
    ) -> Self {
        self.spans.push(ChatSpan::Button {
            color,
            text: text.into(),
            command: None,
            tooltip: Some(tooltip.into()),
        });
        self
    }

    /// Appends every span of `other`.
    pub fn append(mut self, other: ChatMessage) -> Self {
        self.spans.extend(other.spans);
        self
    }

    pub fn spans(&self) -> &[ChatSpan] {
        &self.spans
    }

    /// The visible text with all styling stripped.
    pub fn plain_text(&self) -> String {
        self.spans
            .iter()
            .map(|span| match span {
                ChatSpan::Text(text)
                | ChatSpan::Colored { text, .. }
                | ChatSpan::Button { text, .. } => text.as_str(),
            })
            .collect()
    }

    /// Commands attached to buttons, in order.
    pub fn commands(&self) -> Vec<&str> {
        self.spans
            .iter()
            .filter_map(|span| match span {
                ChatSpan::Button {
                    command: Some(cmd), ..
                } => Some(cmd.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Converts a [`ChatMessage`] into the payload handed to the transport.
pub trait ChatRenderer: Send + Sync + 'static {
    fn render(&self, message: &ChatMessage) -> Value;
}

/// Renders to the JSON text-component format used by the game clients.
///
/// A single coloured span becomes `{"text", "color"}`; anything else
/// becomes a list whose first element is `""` followed by one component
/// per span.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonChatRenderer;

impl JsonChatRenderer {
    fn component(span: &ChatSpan) -> Value {
        match span {
            ChatSpan::Text(text) => Value::String(text.clone()),
            ChatSpan::Colored { color, text } => json!({
                "text": text,
                "color": color.as_str(),
            }),
            ChatSpan::Button {
                color,
                text,
                command,
                tooltip,
            } => {
                let mut map = Map::new();
                map.insert("text".into(), Value::String(text.clone()));
                map.insert("color".into(), Value::String(color.as_str().into()));
                if let Some(cmd) = command {
                    map.insert(
                        "clickEvent".into(),
                        json!({ "action": "run_command", "value": cmd }),
                    );
                }
                if let Some(tip) = tooltip {
                    map.insert(
                        "hoverEvent".into(),
                        json!({ "action": "show_text", "value": tip }),
                    );
                }
                Value::Object(map)
            }
        }
    }
}

impl ChatRenderer for JsonChatRenderer {
    fn render(&self, message: &ChatMessage) -> Value {
        match message.spans() {
            [span @ ChatSpan::Colored { .. }] => Self::component(span),
            spans => {
                let mut list = Vec::with_capacity(spans.len() + 1);
                list.push(Value::String(String::new()));
                list.extend(spans.iter().map(Self::component));
                Value::Array(list)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_single_colored_span_is_object() {
        let msg = ChatMessage::colored(ChatColor::Red, "You are already in a game.");
        let value = JsonChatRenderer.render(&msg);
        assert_eq!(
            value,
            json!({ "text": "You are already in a game.", "color": "red" })
        );
    }

    #[test]
    fn test_render_button_has_click_and_hover() {
        let msg = ChatMessage::new().button(
            ChatColor::Green,
            "[Join]",
            "/game abc join",
            "Join this game.",
        );
        let value = JsonChatRenderer.render(&msg);
        assert_eq!(value[0], "");
        assert_eq!(value[1]["clickEvent"]["value"], "/game abc join");
        assert_eq!(value[1]["hoverEvent"]["value"], "Join this game.");
        assert_eq!(value[1]["color"], "green");
    }

    #[test]
    fn test_render_hover_span_has_no_click() {
        let msg = ChatMessage::new().hover(ChatColor::Gray, "Random", "Picked at boot");
        let value = JsonChatRenderer.render(&msg);
        assert!(value[1].get("clickEvent").is_none());
        assert_eq!(value[1]["hoverEvent"]["value"], "Picked at boot");
    }

    #[test]
    fn test_plain_text_and_commands() {
        let msg = ChatMessage::new()
            .text("Ready? ")
            .button(ChatColor::Green, "[Go!]", "/game start", "Start")
            .text(" ")
            .button(ChatColor::Red, "[Cancel]", "/game quit", "Cancel");
        assert_eq!(msg.plain_text(), "Ready? [Go!] [Cancel]");
        assert_eq!(msg.commands(), vec!["/game start", "/game quit"]);
    }

    #[test]
    fn test_color_names_are_snake_case() {
        assert_eq!(ChatColor::LightPurple.as_str(), "light_purple");
        let json = serde_json::to_string(&ChatColor::LightPurple).unwrap();
        assert_eq!(json, "\"light_purple\"");
    }
}

//! Control protocol for gamehost.
//!
//! This crate defines the "language" spoken between the daemon, the
//! worker processes it boots, and the proxies that carry player commands:
//!
//! - **Identifiers** ([`PlayerId`], [`SessionId`]): opaque UUID newtypes.
//! - **Messages** ([`InboundAction`], [`WorkerInstruction`],
//!   [`SendPlayerServer`], [`PlayerMessage`]): the flat records that
//!   travel on each transport channel.
//! - **Chat** ([`ChatMessage`], [`ChatRenderer`]): the builder seam that
//!   turns a structured message intent into an opaque payload.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer sits between the transport (raw bytes addressed to
//! named endpoints) and the engine (sessions, workers, users). It knows
//! nothing about who is connected or what a session is doing.
//!
//! ```text
//! Transport (bytes) → Protocol (typed messages) → Engine (state)
//! ```

mod chat;
mod codec;
mod error;
mod message;
mod types;

pub use chat::{ChatColor, ChatMessage, ChatRenderer, ChatSpan, JsonChatRenderer};
pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use message::{
    InboundAction, PlayerMessage, SendPlayerServer, WorkerInstruction, channel,
};
pub use types::{PlayerId, SessionId};

//! Transport abstraction layer for gamehost.
//!
//! The daemon does not own the network. Whatever pub/sub system links the
//! daemon, the worker processes, and the player proxies implements
//! [`Transport`]; the daemon only needs three things from it:
//!
//! - "send these bytes on this channel to that named endpoint"
//! - "broadcast these bytes on this channel to everyone"
//! - "who is online, and which endpoints are connected?"
//!
//! Inbound traffic flows the other way: the transport calls the daemon's
//! handle from whatever thread it likes, and the handle only enqueues.
//!
//! [`MemoryTransport`] records every frame in memory. It is what tests and
//! embedded setups use.

mod error;
mod memory;

pub use error::TransportError;
pub use memory::{Frame, MemoryTransport};

use std::fmt;

use gamehost_protocol::PlayerId;

/// A player currently online somewhere on the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnlinePlayer {
    pub id: PlayerId,
    pub name: String,
    /// The endpoint the player is connected to.
    pub endpoint: String,
}

/// Connection status of one named endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointStatus {
    pub name: String,
    pub connected: bool,
    pub players: Vec<OnlinePlayer>,
}

impl fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.connected { "connected" } else { "disconnected" };
        write!(f, "{} ({}) {}", self.name, self.players.len(), status)
    }
}

/// Addressed and broadcast delivery between named endpoints.
///
/// Delivery is best-effort: an `Ok` means the frame was handed to the
/// network, not that anybody read it. Callers that need guarantees must
/// resend.
pub trait Transport: Send + Sync + 'static {
    /// Sends `data` on `channel` to the endpoint called `endpoint`.
    fn send(&self, endpoint: &str, channel: &str, data: &[u8]) -> Result<(), TransportError>;

    /// Sends `data` on `channel` to every connected endpoint.
    fn broadcast(&self, channel: &str, data: &[u8]) -> Result<(), TransportError>;

    /// Every player currently online, across all endpoints.
    fn online_players(&self) -> Vec<OnlinePlayer>;

    /// Returns `true` if `endpoint` is currently reachable.
    fn is_connected(&self, endpoint: &str) -> bool;

    /// Status of every known endpoint.
    fn endpoints(&self) -> Vec<EndpointStatus>;
}

//! In-memory transport: every frame is recorded, nothing leaves the process.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{EndpointStatus, OnlinePlayer, Transport, TransportError};

/// One recorded outbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// `None` for broadcasts.
    pub endpoint: Option<String>,
    pub channel: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
struct Inner {
    frames: Vec<Frame>,
    /// Endpoint name → connected players.
    endpoints: BTreeMap<String, Vec<OnlinePlayer>>,
}

/// A [`Transport`] that keeps everything in memory.
///
/// Cheap to clone; clones share the same frame log and endpoint table, so
/// a test can hand one clone to the daemon and inspect another.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means another test thread panicked while
        // holding it; the frame log itself is still consistent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Marks `endpoint` as connected (with no players if it is new).
    pub fn connect_endpoint(&self, endpoint: &str) {
        self.lock().endpoints.entry(endpoint.to_string()).or_default();
    }

    /// Removes `endpoint` and every player on it.
    pub fn disconnect_endpoint(&self, endpoint: &str) {
        self.lock().endpoints.remove(endpoint);
    }

    /// Puts a player online on `player.endpoint`, connecting it if needed.
    pub fn add_player(&self, player: OnlinePlayer) {
        let mut inner = self.lock();
        for players in inner.endpoints.values_mut() {
            players.retain(|p| p.id != player.id);
        }
        inner
            .endpoints
            .entry(player.endpoint.clone())
            .or_default()
            .push(player);
    }

    /// Every frame sent so far, oldest first.
    pub fn frames(&self) -> Vec<Frame> {
        self.lock().frames.clone()
    }

    /// Frames sent on `channel`, oldest first.
    pub fn frames_on(&self, channel: &str) -> Vec<Frame> {
        self.lock()
            .frames
            .iter()
            .filter(|f| f.channel == channel)
            .cloned()
            .collect()
    }

    /// Removes and returns every recorded frame.
    pub fn take_frames(&self) -> Vec<Frame> {
        std::mem::take(&mut self.lock().frames)
    }
}

impl Transport for MemoryTransport {
    fn send(&self, endpoint: &str, channel: &str, data: &[u8]) -> Result<(), TransportError> {
        let mut inner = self.lock();
        if !inner.endpoints.contains_key(endpoint) {
            return Err(TransportError::NotConnected(endpoint.to_string()));
        }
        tracing::trace!(endpoint, channel, bytes = data.len(), "memory send");
        inner.frames.push(Frame {
            endpoint: Some(endpoint.to_string()),
            channel: channel.to_string(),
            data: data.to_vec(),
        });
        Ok(())
    }

    fn broadcast(&self, channel: &str, data: &[u8]) -> Result<(), TransportError> {
        tracing::trace!(channel, bytes = data.len(), "memory broadcast");
        self.lock().frames.push(Frame {
            endpoint: None,
            channel: channel.to_string(),
            data: data.to_vec(),
        });
        Ok(())
    }

    fn online_players(&self) -> Vec<OnlinePlayer> {
        self.lock().endpoints.values().flatten().cloned().collect()
    }

    fn is_connected(&self, endpoint: &str) -> bool {
        self.lock().endpoints.contains_key(endpoint)
    }

    fn endpoints(&self) -> Vec<EndpointStatus> {
        self.lock()
            .endpoints
            .iter()
            .map(|(name, players)| EndpointStatus {
                name: name.clone(),
                connected: true,
                players: players.clone(),
            })
            .collect()
    }
}

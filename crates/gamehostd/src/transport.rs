//! A transport that writes outbound traffic to the log.
//!
//! Stands in for the network when the daemon runs on its own, e.g. to
//! exercise the console and the boot scripts on a bench machine.

use gamehost_transport::{EndpointStatus, OnlinePlayer, Transport, TransportError};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

impl Transport for LogTransport {
    fn send(&self, endpoint: &str, channel: &str, data: &[u8]) -> Result<(), TransportError> {
        tracing::info!(
            endpoint,
            channel,
            payload = %String::from_utf8_lossy(data),
            "outbound"
        );
        Ok(())
    }

    fn broadcast(&self, channel: &str, data: &[u8]) -> Result<(), TransportError> {
        tracing::info!(channel, payload = %String::from_utf8_lossy(data), "outbound broadcast");
        Ok(())
    }

    fn online_players(&self) -> Vec<OnlinePlayer> {
        Vec::new()
    }

    /// Every endpoint counts as reachable: the log accepts anything.
    fn is_connected(&self, _endpoint: &str) -> bool {
        true
    }

    fn endpoints(&self) -> Vec<EndpointStatus> {
        Vec::new()
    }
}

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The named endpoint is not connected.
    #[error("endpoint {0} is not connected")]
    NotConnected(String),

    /// Handing the frame to the underlying network failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// The transport was shut down.
    #[error("transport shut down")]
    Shutdown,
}

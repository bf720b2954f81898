//! Error types for the protocol layer.
//!
//! Each crate in gamehost defines its own error enum. When you see a
//! `ProtocolError`, the problem is in serialization or in parsing an identifier, not in the
//! transport or in session bookkeeping.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust value).
    ///
    /// Common causes: malformed JSON, a missing `action` key, an
    /// unrecognized action, or a player/game id that is not a UUID.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A textual identifier could not be parsed.
    #[error("invalid identifier {0:?}")]
    InvalidId(String),
}

//! Error types for the protocol layer.

/// Errors that can occur in the protocol layer.
///
/// When you see a `ProtocolError`, the problem is in turning messages
/// into bytes or back, not in networking or game rules.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown message type,
    /// a missing field, or a truncated frame.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded fine but is not valid at the protocol level.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

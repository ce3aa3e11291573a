//! Unified error type for the server.

use standoff_protocol::ProtocolError;
use standoff_session::SessionError;
use standoff_transport::TransportError;

/// Top-level error wrapping every crate's error.
///
/// `#[from]` lets `?` lift sub-crate errors without explicit mapping.
#[derive(Debug, thiserror::Error)]
pub enum StandoffError {
    /// Binding, accepting, or moving frames failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A message could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The session refused a request or has stopped.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The session config file could not be read.
    #[error("cannot read config {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The session config file is not valid JSON for `SessionConfig`.
    #[error("invalid session config: {0}")]
    ConfigParse(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::AcceptFailed(std::io::Error::new(
            std::io::ErrorKind::AddrInUse,
            "port taken",
        ));
        let standoff_err: StandoffError = err.into();
        assert!(matches!(standoff_err, StandoffError::Transport(_)));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let standoff_err: StandoffError = err.into();
        assert!(matches!(standoff_err, StandoffError::Protocol(_)));
        assert!(standoff_err.to_string().contains("bad"));
    }

    #[test]
    fn test_from_session_error() {
        let standoff_err: StandoffError = SessionError::Unavailable.into();
        assert!(matches!(standoff_err, StandoffError::Session(_)));
        assert_eq!(standoff_err.to_string(), "session is unavailable");
    }
}

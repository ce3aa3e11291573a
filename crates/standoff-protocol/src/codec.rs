//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The server doesn't care HOW messages are serialized, it just needs
//! something that implements [`Codec`]. [`JsonCodec`] is the only
//! implementation today; a binary codec can slot in without touching the
//! connection handler.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use standoff_protocol::{ActionKind, ClientMessage, Codec, JsonCodec, PlayerName};
///
/// let codec = JsonCodec;
///
/// let msg = ClientMessage::TakeAction {
///     action: ActionKind::Shoot,
///     target: Some(PlayerName::from("bond")),
/// };
///
/// let bytes = codec.encode(&msg).unwrap();
/// let decoded: ClientMessage = codec.decode(&bytes).unwrap();
/// assert_eq!(msg, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientMessage, Notification, PlayerName, ServerMessage};

    #[test]
    fn test_json_codec_decodes_hand_written_join() {
        let decoded: ClientMessage = JsonCodec
            .decode(br#"{"type":"Join","name":"bond"}"#)
            .unwrap();
        assert_eq!(
            decoded,
            ClientMessage::Join {
                name: PlayerName::from("bond")
            }
        );
    }

    #[test]
    fn test_json_codec_preserves_notification_payload() {
        let msg = ServerMessage::Notification(Notification::PlayerListChanged {
            names: vec![PlayerName::from("a"), PlayerName::from("b")],
        });
        let bytes = JsonCodec.encode(&msg).unwrap();
        let back: ServerMessage = JsonCodec.decode(&bytes).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_json_codec_rejects_garbage() {
        let result: Result<ClientMessage, _> = JsonCodec.decode(b"not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_json_codec_rejects_unknown_message_type() {
        let result: Result<ClientMessage, _> =
            JsonCodec.decode(br#"{"type":"Teleport"}"#);
        assert!(result.is_err());
    }
}

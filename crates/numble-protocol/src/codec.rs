//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The server never calls `serde_json` directly; it goes through a
//! [`Codec`], so swapping the wire encoding touches one type.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because a single codec value is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// JSON is what browser clients speak natively, so it is the default.
///
/// ```rust
/// use numble_protocol::{ClientEnvelope, Codec, Intent, JsonCodec};
///
/// let codec = JsonCodec;
/// let frame = br#"{"requestId":1,"intent":{"type":"join-room","data":{"roomCode":"ABC123"}}}"#;
/// let envelope: ClientEnvelope = codec.decode(frame).unwrap();
/// assert_eq!(envelope.request_id, 1);
/// assert!(matches!(envelope.intent, Intent::JoinRoom { .. }));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

//! Error types for the protocol layer.
//!
//! Each Numble crate owns its error enum. A `ProtocolError` always means
//! "bytes could not become a message (or the reverse)", never a game rule.

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, an unknown intent tag, missing
    /// required fields, or a truncated frame.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A room code that is not six characters of `[A-Z0-9]`.
    #[error("invalid room code {0:?}")]
    InvalidRoomCode(String),
}

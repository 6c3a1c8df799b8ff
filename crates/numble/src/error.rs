//! Unified error type for the Numble server.

use numble_protocol::{ErrorCode, ProtocolError};
use numble_room::RoomError;
use numble_session::SessionError;
use numble_transport::TransportError;

use crate::stats::StatsError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum NumbleError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, malformed room code).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (not authenticated, bad credentials).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (not found, full, wrong turn, bad digits).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The stats collaborator failed.
    #[error(transparent)]
    Stats(#[from] StatsError),

    /// A configuration value could not be used.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl NumbleError {
    /// The wire error code reported to the client.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Session(e) => e.code(),
            Self::Room(e) => e.code(),
            // Room codes are the only protocol values parsed after decoding.
            Self::Protocol(ProtocolError::InvalidRoomCode(_)) => ErrorCode::RoomNotFound,
            Self::Protocol(_) | Self::Transport(_) | Self::Stats(_) | Self::Config(_) => {
                ErrorCode::Internal
            }
        }
    }

    /// The human-readable message sent with a failed reply. Backend and
    /// internal details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            Self::Session(SessionError::Backend(_)) => "Authentication error".to_string(),
            Self::Session(e) => e.to_string(),
            Self::Room(e) => e.to_string(),
            Self::Protocol(ProtocolError::InvalidRoomCode(_)) => "Room not found".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

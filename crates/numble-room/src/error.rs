//! Error types for the room layer.

use numble_protocol::{ErrorCode, RoomCode, UserId};

/// Errors that can occur during room operations.
///
/// All of them are local to one request: they are reported to the caller
/// and leave the room untouched.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code (never existed, expired, or stopped).
    #[error("Room not found")]
    RoomNotFound(RoomCode),

    /// Both seats are taken.
    #[error("Room is full")]
    RoomFull(RoomCode),

    /// The room is past `Waiting` (join) or already `Playing` (secret).
    #[error("Game already in progress")]
    GameInProgress,

    /// A guess arrived outside `Playing`, or a secret after `Finished`.
    #[error("Game not in progress")]
    GameNotInProgress,

    /// The caller has no seat in this room.
    #[error("Player not in room")]
    PlayerNotInRoom(UserId),

    /// The caller guessed out of turn.
    #[error("Not your turn")]
    NotYourTurn,

    #[error("Expected {expected} digits, got {found}")]
    InvalidInputLength { expected: usize, found: usize },

    #[error("Only digits 0-9 are allowed")]
    InvalidDigits,

    /// A secret repeats a digit in a room without duplicates.
    #[error("Digits must not repeat")]
    DuplicateDigits,

    /// Every candidate code collided with a live room.
    #[error("room code space exhausted")]
    CodeSpaceExhausted,
}

impl RoomError {
    /// The wire error code reported to the client.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::RoomNotFound(_) => ErrorCode::RoomNotFound,
            Self::RoomFull(_) => ErrorCode::RoomFull,
            Self::GameInProgress => ErrorCode::GameInProgress,
            Self::GameNotInProgress => ErrorCode::GameNotInProgress,
            Self::PlayerNotInRoom(_) => ErrorCode::PlayerNotInRoom,
            Self::NotYourTurn => ErrorCode::NotYourTurn,
            Self::InvalidInputLength { .. } => ErrorCode::InvalidInputLength,
            Self::InvalidDigits => ErrorCode::InvalidDigits,
            Self::DuplicateDigits => ErrorCode::DuplicateDigits,
            Self::CodeSpaceExhausted => ErrorCode::Internal,
        }
    }
}

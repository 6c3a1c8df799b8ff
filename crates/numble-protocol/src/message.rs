//! Client intents, server replies and room events.
//!
//! The set of messages is closed: every intent a client may send and every
//! event the server may broadcast is a variant here, validated by serde at
//! the boundary before anything reaches a room.
//!
//! ```text
//! client ── ClientEnvelope { requestId, intent } ──→ server
//! client ←── ServerMessage::Reply { requestId, success, data | error } ── server
//! client ←── ServerMessage::Event(RoomEvent) ── server (room broadcast)
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    GameConfig, GameMode, GameState, Identity, PlayerSummary, RoomCode, RoomView,
    UserId, Verdict,
};

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// One frame sent by a client.
///
/// `request_id` is chosen by the client and echoed in the matching reply,
/// so a client can pair replies with requests while events interleave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientEnvelope {
    pub request_id: u64,
    pub intent: Intent,
}

/// A client-initiated request.
///
/// Adjacently tagged, so the JSON reads
/// `{ "type": "join-room", "data": { "roomCode": "ABC123" } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum Intent {
    /// Bind an identity to this connection. `token` wins over `guest_token`
    /// when both are present.
    Authenticate {
        #[serde(default)]
        token: Option<String>,
        #[serde(default)]
        guest_token: Option<String>,
    },

    /// Open a new room with the caller in the first seat.
    CreateRoom {
        #[serde(default)]
        game_mode: GameMode,
        #[serde(default)]
        allow_duplicates: bool,
    },

    /// Take the second seat in an existing room.
    JoinRoom { room_code: String },

    /// Commit the caller's secret number.
    SubmitSecret {
        room_code: String,
        secret_number: String,
    },

    /// Guess the opponent's secret.
    SubmitGuess {
        room_code: String,
        guess_number: String,
    },
}

impl Intent {
    /// The intent's wire name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Authenticate { .. } => "authenticate",
            Self::CreateRoom { .. } => "create-room",
            Self::JoinRoom { .. } => "join-room",
            Self::SubmitSecret { .. } => "submit-secret",
            Self::SubmitGuess { .. } => "submit-guess",
        }
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// The success payload of a reply, one variant per intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Reply {
    Authenticated { user: Identity },
    RoomCreated { room_code: RoomCode, game_config: GameConfig },
    RoomJoined { game: RoomView },
    SecretAccepted,
    GuessAccepted { feedback: Vec<Verdict>, is_win: bool },
}

/// Machine-readable reason a request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    NotAuthenticated,
    AuthenticationFailed,
    AlreadyAuthenticated,
    RoomNotFound,
    RoomFull,
    GameInProgress,
    GameNotInProgress,
    PlayerNotInRoom,
    NotYourTurn,
    InvalidInputLength,
    InvalidDigits,
    DuplicateDigits,
    Internal,
}

/// Why a request failed: a code for programs, a message for people.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// A broadcast to every connection subscribed to a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum RoomEvent {
    /// Someone took a seat.
    RoomUpdated {
        room_code: RoomCode,
        players: Vec<PlayerSummary>,
        game_state: GameState,
        game_mode: GameMode,
    },

    /// Both secrets are in; `current_turn` guesses first.
    GameStarted {
        room_code: RoomCode,
        game_state: GameState,
        current_turn: UserId,
    },

    /// A guess was evaluated.
    GuessReceived {
        room_code: RoomCode,
        player_id: UserId,
        guess_number: String,
        feedback: Vec<Verdict>,
        game_state: GameState,
        winner: Option<UserId>,
        current_turn: Option<UserId>,
    },

    /// `player_id` ran out of time and lost their turn.
    TurnForfeited {
        room_code: RoomCode,
        player_id: UserId,
        current_turn: UserId,
    },
}

impl RoomEvent {
    /// The room the event belongs to.
    pub fn room_code(&self) -> &RoomCode {
        match self {
            Self::RoomUpdated { room_code, .. }
            | Self::GameStarted { room_code, .. }
            | Self::GuessReceived { room_code, .. }
            | Self::TurnForfeited { room_code, .. } => room_code,
        }
    }
}

/// Every frame the server sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// The answer to one [`ClientEnvelope`], matched by `request_id`.
    Reply {
        request_id: u64,
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Reply>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<ErrorBody>,
    },

    /// A room broadcast.
    Event(RoomEvent),
}

impl ServerMessage {
    /// A successful reply.
    pub fn ok(request_id: u64, reply: Reply) -> Self {
        Self::Reply {
            request_id,
            success: true,
            data: Some(reply),
            error: None,
        }
    }

    /// A failed reply.
    pub fn failure(request_id: u64, code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Reply {
            request_id,
            success: false,
            data: None,
            error: Some(ErrorBody {
                code,
                message: message.into(),
            }),
        }
    }
}

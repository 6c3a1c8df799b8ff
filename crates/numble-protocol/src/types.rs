//! Core domain types that travel on the wire.
//!
//! Identities, room codes, the game enums and the public-safe views of a
//! room. Nothing in this module ever carries a player's secret: the views
//! are what every connection in a room is allowed to see.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A user's account id, as issued by the identity collaborator.
///
/// Newtype over `String` so a user id can't be confused with a username or
/// a room code. `#[serde(transparent)]` keeps it a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Whether an account is a throwaway guest or a registered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Guest,
    Persistent,
}

/// Who is on the other end of a connection.
///
/// Supplied once per connection by the session layer and trusted for the
/// lifetime of that connection. Rooms treat it as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    pub account_type: AccountType,
}

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// Number of characters in a room code.
pub const ROOM_CODE_LEN: usize = 6;

/// The symbols a room code is drawn from.
pub const ROOM_CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// The short code players share to meet in a room, e.g. `"ABC123"`.
///
/// Always six characters of `[A-Z0-9]`. [`RoomCode::parse`] trims and
/// upper-cases its input first, so `" abc123 "` is accepted as `ABC123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Validates and normalizes a room code.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidRoomCode`] if the trimmed,
    /// upper-cased input is not six characters of `[A-Z0-9]`.
    pub fn parse(value: &str) -> Result<Self, ProtocolError> {
        let normalized = value.trim().to_ascii_uppercase();
        let valid = normalized.len() == ROOM_CODE_LEN
            && normalized.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b));
        if !valid {
            return Err(ProtocolError::InvalidRoomCode(value.to_string()));
        }
        Ok(Self(normalized))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomCode {
    type Err = ProtocolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

// ---------------------------------------------------------------------------
// Game enums
// ---------------------------------------------------------------------------

/// The rule variant a room is played under.
///
/// Only `Ultimate` (longer secrets) and `Speed` (per-turn time limit)
/// change the game's parameters; `Deception` is a label carried through to
/// clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Classic,
    Speed,
    Deception,
    Ultimate,
}

impl GameMode {
    /// How many digits secrets and guesses have in this mode.
    pub fn digit_count(self) -> usize {
        match self {
            Self::Ultimate => 6,
            _ => 4,
        }
    }

    /// The per-turn time limit in seconds, if the mode has one.
    pub fn time_per_turn_secs(self) -> Option<u64> {
        match self {
            Self::Speed => Some(30),
            _ => None,
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Classic => "classic",
            Self::Speed => "speed",
            Self::Deception => "deception",
            Self::Ultimate => "ultimate",
        };
        f.write_str(name)
    }
}

/// The lifecycle state of a room.
///
/// Transitions are strictly forward, no skipping:
///
/// ```text
/// Waiting → Ready → Playing → Finished
/// ```
///
/// - **Waiting**: one player seated, accepting a second.
/// - **Ready**: both seats taken, waiting for both secrets.
/// - **Playing**: both secrets in, players alternate guesses.
/// - **Finished**: someone matched the opponent's secret. Read-only from
///   here until the room expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    Waiting,
    Ready,
    Playing,
    Finished,
}

impl GameState {
    /// Returns `true` if a new player may take a seat.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// The state that follows this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Ready),
            Self::Ready => Some(Self::Playing),
            Self::Playing => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// Returns `true` if `target` is the immediate successor of `self`.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Waiting => "waiting",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// The judgement for one digit of a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Right digit, right position.
    Green,
    /// Digit appears elsewhere in the secret (and wasn't already used up).
    Yellow,
    /// No unused occurrence of this digit in the secret.
    Gray,
}

// ---------------------------------------------------------------------------
// Room configuration and views
// ---------------------------------------------------------------------------

/// Parameters a room is created with, echoed to its creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub digit_count: usize,
    pub allow_duplicates: bool,
    pub mode: GameMode,
    /// Seconds per turn; only set in `Speed` mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_per_turn: Option<u64>,
}

impl GameConfig {
    /// Derives the configuration for a mode.
    pub fn new(mode: GameMode, allow_duplicates: bool) -> Self {
        Self {
            digit_count: mode.digit_count(),
            allow_duplicates,
            mode,
            time_per_turn: mode.time_per_turn_secs(),
        }
    }
}

/// One entry in a player's guess log. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessRecord {
    pub guess_number: String,
    pub feedback: Vec<Verdict>,
    /// Milliseconds since the Unix epoch.
    pub submitted_at: u64,
}

/// The minimal player listing used in `room-updated` broadcasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub id: UserId,
    pub username: String,
}

/// Everything about a seated player that any room member may see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: UserId,
    pub username: String,
    /// Whether the player has committed a secret. The secret itself is
    /// never part of a view.
    pub has_secret: bool,
    pub guesses: Vec<GuessRecord>,
    pub score: usize,
}

/// Public-safe snapshot of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub room_code: RoomCode,
    pub players: Vec<PlayerView>,
    pub game_mode: GameMode,
    pub game_state: GameState,
    pub game_config: GameConfig,
    pub current_turn: Option<UserId>,
    pub winner: Option<UserId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_code_parse_normalizes_case_and_whitespace() {
        let code = RoomCode::parse("  abc123 ").unwrap();
        assert_eq!(code.as_str(), "ABC123");
    }

    #[test]
    fn test_room_code_parse_rejects_wrong_length() {
        assert!(RoomCode::parse("ABC12").is_err());
        assert!(RoomCode::parse("ABC1234").is_err());
    }

    #[test]
    fn test_room_code_parse_rejects_symbols() {
        assert!(matches!(
            RoomCode::parse("AB-123"),
            Err(ProtocolError::InvalidRoomCode(_))
        ));
    }

    #[test]
    fn test_room_code_serializes_as_plain_string() {
        let code = RoomCode::parse("ZZ9ZZ9").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"ZZ9ZZ9\"");
    }

    #[test]
    fn test_room_code_deserialize_rejects_invalid_code() {
        let result: Result<RoomCode, _> = serde_json::from_str("\"nope\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_game_mode_parameters() {
        assert_eq!(GameMode::Classic.digit_count(), 4);
        assert_eq!(GameMode::Ultimate.digit_count(), 6);
        assert_eq!(GameMode::Speed.time_per_turn_secs(), Some(30));
        assert_eq!(GameMode::Deception.time_per_turn_secs(), None);
    }

    #[test]
    fn test_game_mode_default_is_classic() {
        assert_eq!(GameMode::default(), GameMode::Classic);
    }

    #[test]
    fn test_game_state_next_follows_strict_order() {
        assert_eq!(GameState::Waiting.next(), Some(GameState::Ready));
        assert_eq!(GameState::Ready.next(), Some(GameState::Playing));
        assert_eq!(GameState::Playing.next(), Some(GameState::Finished));
        assert_eq!(GameState::Finished.next(), None);
    }

    #[test]
    fn test_game_state_can_transition_to() {
        assert!(GameState::Waiting.can_transition_to(GameState::Ready));
        assert!(!GameState::Waiting.can_transition_to(GameState::Playing));
        assert!(!GameState::Finished.can_transition_to(GameState::Waiting));
    }

    #[test]
    fn test_game_state_is_joinable_only_while_waiting() {
        assert!(GameState::Waiting.is_joinable());
        assert!(!GameState::Ready.is_joinable());
        assert!(!GameState::Playing.is_joinable());
        assert!(!GameState::Finished.is_joinable());
    }

    #[test]
    fn test_enums_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&GameState::Playing).unwrap(), "\"playing\"");
        assert_eq!(serde_json::to_string(&Verdict::Gray).unwrap(), "\"gray\"");
        assert_eq!(serde_json::to_string(&GameMode::Ultimate).unwrap(), "\"ultimate\"");
        assert_eq!(serde_json::to_string(&AccountType::Guest).unwrap(), "\"guest\"");
    }

    #[test]
    fn test_game_config_speed_json_shape() {
        let json = serde_json::to_value(GameConfig::new(GameMode::Speed, true)).unwrap();
        assert_eq!(json["digitCount"], 4);
        assert_eq!(json["allowDuplicates"], true);
        assert_eq!(json["mode"], "speed");
        assert_eq!(json["timePerTurn"], 30);
    }

    #[test]
    fn test_game_config_classic_omits_time_per_turn() {
        let json = serde_json::to_value(GameConfig::new(GameMode::Classic, false)).unwrap();
        assert!(json.get("timePerTurn").is_none());
    }

    #[test]
    fn test_identity_json_uses_camel_case() {
        let identity = Identity {
            user_id: UserId::from("u-1"),
            username: "alice".into(),
            account_type: AccountType::Persistent,
        };
        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["userId"], "u-1");
        assert_eq!(json["accountType"], "persistent");
    }
}

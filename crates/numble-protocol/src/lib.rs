//! Wire protocol for the Numble game server.
//!
//! This crate defines the "language" clients and the server speak:
//!
//! - **Types** ([`Identity`], [`RoomCode`], [`GameState`], [`RoomView`], ...)
//!   the domain values that appear in messages.
//! - **Messages** ([`ClientEnvelope`], [`Intent`], [`ServerMessage`],
//!   [`RoomEvent`]) the closed set of frames on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) how frames become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes) → Protocol (ClientEnvelope) → Session / Coordinator
//! ```

mod codec;
mod error;
mod message;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{
    ClientEnvelope, ErrorBody, ErrorCode, Intent, Reply, RoomEvent, ServerMessage,
};
pub use types::{
    AccountType, GameConfig, GameMode, GameState, GuessRecord, Identity,
    PlayerSummary, PlayerView, ROOM_CODE_ALPHABET, ROOM_CODE_LEN, RoomCode,
    RoomView, UserId, Verdict,
};

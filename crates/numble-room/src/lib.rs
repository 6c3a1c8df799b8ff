//! Room coordination for the Numble game server.
//!
//! Each room runs as an isolated Tokio task (actor model) owning one
//! [`Room`] state machine. The [`RoomRegistry`] maps codes to running
//! rooms and expires them.
//!
//! # Key types
//!
//! - [`evaluate`]: scores a guess against a secret
//! - [`Room`]: membership, secrets, turn order, guess log, win detection
//! - [`RoomHandle`]: send intents to a running room actor
//! - [`RoomRegistry`]: creates, finds and expires rooms
//! - [`RoomConfig`]: TTL, sweep interval, turn timer

mod actor;
mod codegen;
mod config;
mod error;
mod feedback;
mod registry;
mod room;

pub use actor::{EventSender, RoomHandle};
pub use codegen::{
    generate_room_code, generate_room_code_with, generate_secret, generate_secret_with,
};
pub use config::RoomConfig;
pub use error::RoomError;
pub use feedback::{evaluate, is_win};
pub use registry::RoomRegistry;
pub use room::{GuessOutcome, JoinOutcome, MatchResult, Room, Seat};

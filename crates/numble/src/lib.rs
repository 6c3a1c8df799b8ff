//! # Numble
//!
//! Real-time server for a two-player number-guessing game.
//!
//! Each player commits a secret number, then they take turns guessing the
//! opponent's. Every guess is scored digit by digit (green, yellow, gray)
//! and the first full match wins. The server is authoritative: secrets
//! never leave it, and every room's intents are applied one at a time by
//! that room's actor.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use numble::prelude::*;
//!
//! # async fn run() -> Result<(), NumbleError> {
//! let identities = MemoryIdentityProvider::new();
//! identities.register_token("secret-token", Identity {
//!     user_id: UserId::from("alice"),
//!     username: "alice".into(),
//!     account_type: AccountType::Persistent,
//! }).await;
//!
//! let server = NumbleServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(identities, Arc::new(MemoryStats::new()))
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod coordinator;
mod error;
mod handler;
mod server;
mod stats;

pub use config::ServerConfig;
pub use coordinator::MatchCoordinator;
pub use error::NumbleError;
pub use server::{NumbleServer, NumbleServerBuilder};
pub use stats::{GameResult, MemoryStats, PlayerStats, StatsError, StatsRecorder};

pub mod prelude {
    //! Everything needed to run a server or write a collaborator.

    pub use crate::{
        GameResult, MatchCoordinator, MemoryStats, NumbleError, NumbleServer,
        NumbleServerBuilder, PlayerStats, ServerConfig, StatsError, StatsRecorder,
    };
    pub use numble_protocol::{
        AccountType, ClientEnvelope, ErrorCode, GameMode, GameState, Identity, Intent,
        Reply, RoomCode, RoomEvent, RoomView, ServerMessage, UserId, Verdict,
    };
    pub use numble_room::{RoomConfig, RoomRegistry};
    pub use numble_session::{IdentityProvider, MemoryIdentityProvider, SessionError};
}

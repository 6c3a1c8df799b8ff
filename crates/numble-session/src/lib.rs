//! Session binding for the Numble game server.
//!
//! This crate answers "who is on this connection?":
//!
//! 1. **Identity lookup**: the [`IdentityProvider`] collaborator trait,
//!    plus [`MemoryIdentityProvider`] for development and tests.
//! 2. **Binding**: [`SessionBinding`] pins one identity to one connection
//!    and remembers which rooms that connection listens to.
//!
//! ```text
//! Coordinator (above)  ← asks the binding for the caller's identity
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Protocol + Transport (below)  ← Identity, RoomCode, ConnectionId
//! ```

mod auth;
mod binding;
mod error;
mod memory;

pub use auth::IdentityProvider;
pub use binding::SessionBinding;
pub use error::SessionError;
pub use memory::MemoryIdentityProvider;

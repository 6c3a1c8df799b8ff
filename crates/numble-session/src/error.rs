//! Error types for the session layer.

use numble_protocol::{ErrorCode, UserId};

/// Errors that can occur while binding an identity to a connection.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// An intent other than `authenticate` arrived before a successful
    /// `authenticate` on this connection.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The credentials were missing, unknown or expired.
    #[error("Authentication failed")]
    AuthFailed,

    /// The identity collaborator itself failed (storage down, etc.).
    /// Distinct from [`AuthFailed`](Self::AuthFailed): the credentials may
    /// well be valid.
    #[error("Authentication error: {0}")]
    Backend(String),

    /// The connection is already bound to a different user.
    #[error("connection already authenticated as {0}")]
    AlreadyAuthenticated(UserId),
}

impl SessionError {
    /// The wire error code reported to the client.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotAuthenticated => ErrorCode::NotAuthenticated,
            Self::AuthFailed | Self::Backend(_) => ErrorCode::AuthenticationFailed,
            Self::AlreadyAuthenticated(_) => ErrorCode::AlreadyAuthenticated,
        }
    }
}

//! The identity collaborator hook.
//!
//! Numble doesn't store accounts or check passwords. Whoever does (a REST
//! auth service, a database, a test fixture) implements
//! [`IdentityProvider`], and the session layer calls it when a connection
//! sends `authenticate`.

use numble_protocol::Identity;

use crate::SessionError;

/// Resolves client credentials to an [`Identity`].
///
/// `Send + Sync + 'static` because one provider is shared by every
/// connection task for the lifetime of the server.
///
/// Both lookups return:
/// - `Ok(Some(identity))` when the credential is valid,
/// - `Ok(None)` when it is unknown or expired,
/// - `Err(SessionError::Backend)` when the lookup itself failed.
///
/// # Example
///
/// ```rust
/// use numble_protocol::{AccountType, Identity, UserId};
/// use numble_session::{IdentityProvider, SessionError};
///
/// /// Treats every token as a username. Development only!
/// struct TrustingProvider;
///
/// impl IdentityProvider for TrustingProvider {
///     async fn verify_token(&self, token: &str) -> Result<Option<Identity>, SessionError> {
///         Ok(Some(Identity {
///             user_id: UserId(token.to_string()),
///             username: token.to_string(),
///             account_type: AccountType::Persistent,
///         }))
///     }
///
///     async fn lookup_guest_session(&self, _guest_token: &str) -> Result<Option<Identity>, SessionError> {
///         Ok(None)
///     }
/// }
/// ```
pub trait IdentityProvider: Send + Sync + 'static {
    /// Verifies a signed account token.
    fn verify_token(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Option<Identity>, SessionError>> + Send;

    /// Looks up the guest account behind a guest session token.
    fn lookup_guest_session(
        &self,
        guest_token: &str,
    ) -> impl std::future::Future<Output = Result<Option<Identity>, SessionError>> + Send;
}

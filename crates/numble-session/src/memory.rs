//! An in-memory [`IdentityProvider`].
//!
//! Holds account tokens registered up front and guest sessions issued at
//! runtime. The `numble-server` binary seeds it from configuration; tests
//! use it as a fixture.

use std::collections::HashMap;

use numble_protocol::{AccountType, Identity, UserId};
use rand::Rng;
use tokio::sync::RwLock;

use crate::{IdentityProvider, SessionError};

/// Token → identity maps behind async read/write locks.
///
/// Lookups vastly outnumber registrations, hence `RwLock` rather than
/// `Mutex`: any number of connections can authenticate at once.
#[derive(Debug, Default)]
pub struct MemoryIdentityProvider {
    tokens: RwLock<HashMap<String, Identity>>,
    guests: RwLock<HashMap<String, Identity>>,
}

impl MemoryIdentityProvider {
    /// Creates an empty provider. Every credential fails until registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider that accepts the given account tokens.
    pub fn from_tokens(tokens: impl IntoIterator<Item = (String, Identity)>) -> Self {
        Self {
            tokens: RwLock::new(tokens.into_iter().collect()),
            guests: RwLock::new(HashMap::new()),
        }
    }

    /// Registers (or replaces) an account token.
    pub async fn register_token(&self, token: impl Into<String>, identity: Identity) {
        self.tokens.write().await.insert(token.into(), identity);
    }

    /// Creates a guest account and returns its session token.
    ///
    /// The token is 32 random bytes in hex; the guest's user id is drawn
    /// independently so it can be shown to other players without leaking
    /// the token.
    pub async fn issue_guest_session(&self, username: impl Into<String>) -> (String, Identity) {
        let token = random_hex(32);
        let identity = Identity {
            user_id: UserId(format!("guest-{}", random_hex(6))),
            username: username.into(),
            account_type: AccountType::Guest,
        };
        self.guests.write().await.insert(token.clone(), identity.clone());
        tracing::debug!(user_id = %identity.user_id, "guest session issued");
        (token, identity)
    }

    /// Forgets a guest session. Returns `true` if it existed.
    pub async fn revoke_guest_session(&self, guest_token: &str) -> bool {
        self.guests.write().await.remove(guest_token).is_some()
    }
}

impl IdentityProvider for MemoryIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<Option<Identity>, SessionError> {
        Ok(self.tokens.read().await.get(token).cloned())
    }

    async fn lookup_guest_session(
        &self,
        guest_token: &str,
    ) -> Result<Option<Identity>, SessionError> {
        Ok(self.guests.read().await.get(guest_token).cloned())
    }
}

/// `len` random bytes formatted as lowercase hex (`2 * len` characters).
fn random_hex(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len).map(|_| format!("{:02x}", rng.random::<u8>())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Identity {
        Identity {
            user_id: UserId::from("u-alice"),
            username: "alice".into(),
            account_type: AccountType::Persistent,
        }
    }

    #[tokio::test]
    async fn test_verify_token_known_returns_identity() {
        let provider = MemoryIdentityProvider::from_tokens([("t-1".to_string(), alice())]);
        let found = provider.verify_token("t-1").await.unwrap();
        assert_eq!(found, Some(alice()));
    }

    #[tokio::test]
    async fn test_verify_token_unknown_returns_none() {
        let provider = MemoryIdentityProvider::new();
        assert_eq!(provider.verify_token("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_register_token_replaces_existing() {
        let provider = MemoryIdentityProvider::from_tokens([("t".to_string(), alice())]);
        let mut renamed = alice();
        renamed.username = "alicia".into();
        provider.register_token("t", renamed.clone()).await;
        assert_eq!(provider.verify_token("t").await.unwrap(), Some(renamed));
    }

    #[tokio::test]
    async fn test_issue_guest_session_token_is_64_hex_chars() {
        let provider = MemoryIdentityProvider::new();
        let (token, identity) = provider.issue_guest_session("visitor").await;

        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(identity.account_type, AccountType::Guest);
        assert!(identity.user_id.as_str().starts_with("guest-"));
        assert!(!identity.user_id.as_str().contains(&token[..12]));
    }

    #[tokio::test]
    async fn test_guest_sessions_are_unique() {
        let provider = MemoryIdentityProvider::new();
        let (t1, i1) = provider.issue_guest_session("a").await;
        let (t2, i2) = provider.issue_guest_session("b").await;
        assert_ne!(t1, t2);
        assert_ne!(i1.user_id, i2.user_id);
    }

    #[tokio::test]
    async fn test_lookup_guest_session_after_revoke_returns_none() {
        let provider = MemoryIdentityProvider::new();
        let (token, identity) = provider.issue_guest_session("visitor").await;
        assert_eq!(provider.lookup_guest_session(&token).await.unwrap(), Some(identity));

        assert!(provider.revoke_guest_session(&token).await);
        assert_eq!(provider.lookup_guest_session(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_guest_token_is_not_an_account_token() {
        let provider = MemoryIdentityProvider::new();
        let (token, _) = provider.issue_guest_session("visitor").await;
        assert_eq!(provider.verify_token(&token).await.unwrap(), None);
    }
}

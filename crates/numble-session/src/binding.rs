//! Session binding: which identity speaks on a given connection.
//!
//! A binding starts anonymous. The first successful `authenticate` pins an
//! [`Identity`] to it for the rest of the connection's life; every other
//! intent asks the binding for that identity first.
//!
//! ```text
//!   Anonymous ──(authenticate ok)──→ Bound(identity)
//!       │                               │
//!       └─(any other intent)─→ NotAuthenticated
//! ```

use std::collections::BTreeSet;

use numble_protocol::{Identity, RoomCode};
use numble_transport::ConnectionId;

use crate::{IdentityProvider, SessionError};

/// Per-connection session state. Owned by that connection's handler task,
/// so it needs no locking.
#[derive(Debug)]
pub struct SessionBinding {
    connection: ConnectionId,
    identity: Option<Identity>,
    /// Rooms this connection subscribed to, so they can be told when it
    /// goes away.
    rooms: BTreeSet<RoomCode>,
}

impl SessionBinding {
    /// Creates an anonymous binding for a freshly accepted connection.
    pub fn new(connection: ConnectionId) -> Self {
        Self {
            connection,
            identity: None,
            rooms: BTreeSet::new(),
        }
    }

    /// The connection this binding belongs to.
    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    /// The bound identity.
    ///
    /// # Errors
    /// [`SessionError::NotAuthenticated`] until `authenticate` succeeded.
    pub fn identity(&self) -> Result<&Identity, SessionError> {
        self.identity.as_ref().ok_or(SessionError::NotAuthenticated)
    }

    /// Returns `true` once an identity is bound.
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Resolves credentials through `provider` and binds the result.
    ///
    /// `token` is tried first; `guest_token` only when no `token` was sent.
    /// Re-authenticating as the same user is a no-op success; as anyone
    /// else it is refused, since the connection's rooms already act on the
    /// first identity.
    ///
    /// # Errors
    /// - [`SessionError::AuthFailed`] for missing or unknown credentials
    /// - [`SessionError::Backend`] if the provider itself failed
    /// - [`SessionError::AlreadyAuthenticated`] for an identity switch
    pub async fn authenticate<P: IdentityProvider>(
        &mut self,
        provider: &P,
        token: Option<&str>,
        guest_token: Option<&str>,
    ) -> Result<&Identity, SessionError> {
        let resolved = match (token, guest_token) {
            (Some(token), _) => provider.verify_token(token).await?,
            (None, Some(guest)) => provider.lookup_guest_session(guest).await?,
            (None, None) => None,
        };
        let identity = resolved.ok_or(SessionError::AuthFailed)?;

        if let Some(current) = &self.identity {
            if current.user_id != identity.user_id {
                return Err(SessionError::AlreadyAuthenticated(current.user_id.clone()));
            }
        }

        tracing::info!(
            conn_id = %self.connection,
            user_id = %identity.user_id,
            "connection authenticated"
        );
        Ok(self.identity.insert(identity))
    }

    /// Remembers that this connection now receives `code`'s broadcasts.
    pub fn record_room(&mut self, code: RoomCode) {
        self.rooms.insert(code);
    }

    /// Rooms this connection is subscribed to, in code order.
    pub fn rooms(&self) -> impl Iterator<Item = &RoomCode> {
        self.rooms.iter()
    }

    /// Empties and returns the room list. Used on disconnect.
    pub fn take_rooms(&mut self) -> Vec<RoomCode> {
        std::mem::take(&mut self.rooms).into_iter().collect()
    }
}

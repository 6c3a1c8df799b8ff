//! Match coordinator: turns client intents into room operations.
//!
//! One coordinator is shared by every connection. For each intent it
//! checks the caller's session, finds the room and hands the operation to
//! that room's actor. Broadcasting happens inside the actor; the
//! coordinator only builds the caller's reply. When a guess finishes a
//! match, the result goes to the stats collaborator on a separate task.

use std::sync::Arc;

use numble_protocol::{Intent, Reply, RoomCode};
use numble_room::{EventSender, RoomHandle, RoomRegistry};
use numble_session::{IdentityProvider, SessionBinding};
use numble_transport::ConnectionId;

use crate::NumbleError;
use crate::stats::{GameResult, StatsRecorder};

/// Dispatches the five client intents.
pub struct MatchCoordinator<P, S> {
    registry: Arc<RoomRegistry>,
    identities: P,
    stats: Arc<S>,
}

impl<P: IdentityProvider, S: StatsRecorder> MatchCoordinator<P, S> {
    pub fn new(registry: Arc<RoomRegistry>, identities: P, stats: Arc<S>) -> Self {
        Self {
            registry,
            identities,
            stats,
        }
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Applies one intent on behalf of `session`.
    ///
    /// `events` is the connection's outbound queue; rooms the caller
    /// creates or joins broadcast into it.
    ///
    /// # Errors
    /// Any request-local failure. Nothing here affects other connections
    /// or rooms.
    pub async fn dispatch(
        &self,
        session: &mut SessionBinding,
        events: &EventSender,
        intent: Intent,
    ) -> Result<Reply, NumbleError> {
        match intent {
            Intent::Authenticate { token, guest_token } => {
                let user = session
                    .authenticate(&self.identities, token.as_deref(), guest_token.as_deref())
                    .await?
                    .clone();
                Ok(Reply::Authenticated { user })
            }

            Intent::CreateRoom {
                game_mode,
                allow_duplicates,
            } => {
                let creator = session.identity()?.clone();
                let handle = self
                    .registry
                    .create(
                        creator,
                        game_mode,
                        allow_duplicates,
                        session.connection(),
                        events.clone(),
                    )
                    .await?;
                session.record_room(handle.code().clone());
                Ok(Reply::RoomCreated {
                    room_code: handle.code().clone(),
                    game_config: handle.config().clone(),
                })
            }

            Intent::JoinRoom { room_code } => {
                let identity = session.identity()?.clone();
                let handle = self.room(&room_code).await?;
                let game = handle
                    .join(identity, session.connection(), events.clone())
                    .await?;
                session.record_room(handle.code().clone());
                Ok(Reply::RoomJoined { game })
            }

            Intent::SubmitSecret {
                room_code,
                secret_number,
            } => {
                let user_id = session.identity()?.user_id.clone();
                let handle = self.room(&room_code).await?;
                handle.submit_secret(user_id, secret_number).await?;
                Ok(Reply::SecretAccepted)
            }

            Intent::SubmitGuess {
                room_code,
                guess_number,
            } => {
                let user_id = session.identity()?.user_id.clone();
                let handle = self.room(&room_code).await?;
                let outcome = handle.submit_guess(user_id, guess_number).await?;
                if let Some(result) = &outcome.result {
                    let mode = handle.config().mode;
                    self.record_result(GameResult::from_match(handle.code().clone(), mode, result));
                }
                Ok(Reply::GuessAccepted {
                    feedback: outcome.feedback,
                    is_win: outcome.is_win,
                })
            }
        }
    }

    /// Stops broadcasting to `connection` in each of `rooms`. Players keep
    /// their seats; rooms that are already gone are skipped.
    pub async fn release(&self, connection: ConnectionId, rooms: Vec<RoomCode>) {
        for code in rooms {
            if let Ok(handle) = self.registry.get(&code).await {
                let _ = handle.unsubscribe(connection).await;
            }
        }
        tracing::debug!(conn_id = %connection, "connection released from rooms");
    }

    async fn room(&self, raw_code: &str) -> Result<RoomHandle, NumbleError> {
        let code = RoomCode::parse(raw_code)?;
        Ok(self.registry.get(&code).await?)
    }

    fn record_result(&self, result: GameResult) {
        let stats = Arc::clone(&self.stats);
        tokio::spawn(async move {
            let room_code = result.room_code.clone();
            match stats.record_game_result(result).await {
                Ok(()) => tracing::debug!(%room_code, "game result recorded"),
                Err(e) => tracing::warn!(%room_code, error = %e, "failed to record game result"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use numble_protocol::{
        AccountType, ErrorCode, GameMode, GameState, Identity, RoomEvent, ServerMessage,
        UserId, Verdict,
    };
    use numble_room::RoomConfig;
    use numble_session::MemoryIdentityProvider;
    use tokio::sync::mpsc;

    use super::*;
    use crate::stats::{MemoryStats, StatsError};

    type Outbound = mpsc::UnboundedReceiver<ServerMessage>;

    fn identity(id: &str) -> Identity {
        Identity {
            user_id: UserId::from(id),
            username: format!("{id}-name"),
            account_type: AccountType::Persistent,
        }
    }

    fn coordinator() -> (MatchCoordinator<MemoryIdentityProvider, MemoryStats>, Arc<MemoryStats>) {
        let identities = MemoryIdentityProvider::from_tokens([
            ("tok-alice".to_string(), identity("alice")),
            ("tok-bob".to_string(), identity("bob")),
        ]);
        let stats = Arc::new(MemoryStats::new());
        let registry = Arc::new(RoomRegistry::new(RoomConfig::default()));
        (
            MatchCoordinator::new(registry, identities, Arc::clone(&stats)),
            stats,
        )
    }

    /// A client connection: its session plus its outbound queue.
    struct Client {
        session: SessionBinding,
        tx: EventSender,
        rx: Outbound,
    }

    impl Client {
        fn new(id: u64) -> Self {
            let (tx, rx) = mpsc::unbounded_channel();
            Self {
                session: SessionBinding::new(ConnectionId::new(id)),
                tx,
                rx,
            }
        }

        async fn send<P: IdentityProvider, S: StatsRecorder>(
            &mut self,
            coordinator: &MatchCoordinator<P, S>,
            intent: Intent,
        ) -> Result<Reply, NumbleError> {
            coordinator.dispatch(&mut self.session, &self.tx, intent).await
        }
    }

    fn auth(token: &str) -> Intent {
        Intent::Authenticate {
            token: Some(token.into()),
            guest_token: None,
        }
    }

    fn create() -> Intent {
        Intent::CreateRoom {
            game_mode: GameMode::Classic,
            allow_duplicates: false,
        }
    }

    fn join(code: &str) -> Intent {
        Intent::JoinRoom {
            room_code: code.into(),
        }
    }

    fn secret(code: &str, value: &str) -> Intent {
        Intent::SubmitSecret {
            room_code: code.into(),
            secret_number: value.into(),
        }
    }

    fn guess(code: &str, value: &str) -> Intent {
        Intent::SubmitGuess {
            room_code: code.into(),
            guess_number: value.into(),
        }
    }

    /// Alice creates, bob joins, secrets "4096" / "1234". Returns the code.
    async fn start_match<P: IdentityProvider, S: StatsRecorder>(
        c: &MatchCoordinator<P, S>,
        alice: &mut Client,
        bob: &mut Client,
    ) -> String {
        alice.send(c, auth("tok-alice")).await.unwrap();
        bob.send(c, auth("tok-bob")).await.unwrap();
        let Reply::RoomCreated { room_code, .. } = alice.send(c, create()).await.unwrap() else {
            panic!("expected room-created");
        };
        let code = room_code.to_string();
        bob.send(c, join(&code.to_lowercase())).await.unwrap();
        alice.send(c, secret(&code, "4096")).await.unwrap();
        bob.send(c, secret(&code, "1234")).await.unwrap();
        code
    }

    #[tokio::test]
    async fn test_intents_require_authentication() {
        let (c, _) = coordinator();
        let mut client = Client::new(1);
        for intent in [create(), join("ABC123"), secret("ABC123", "1234"), guess("ABC123", "1234")] {
            let err = client.send(&c, intent).await.unwrap_err();
            assert_eq!(err.code(), ErrorCode::NotAuthenticated);
        }
    }

    #[tokio::test]
    async fn test_authenticate_replies_with_user() {
        let (c, _) = coordinator();
        let mut client = Client::new(1);
        let reply = client.send(&c, auth("tok-alice")).await.unwrap();
        assert_eq!(
            reply,
            Reply::Authenticated {
                user: identity("alice")
            }
        );
    }

    #[tokio::test]
    async fn test_authenticate_bad_token_fails() {
        let (c, _) = coordinator();
        let mut client = Client::new(1);
        let err = client.send(&c, auth("nope")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::AuthenticationFailed);
        assert_eq!(err.client_message(), "Authentication failed");
    }

    #[tokio::test]
    async fn test_create_room_replies_with_config() {
        let (c, _) = coordinator();
        let mut alice = Client::new(1);
        alice.send(&c, auth("tok-alice")).await.unwrap();
        let reply = alice
            .send(
                &c,
                Intent::CreateRoom {
                    game_mode: GameMode::Speed,
                    allow_duplicates: true,
                },
            )
            .await
            .unwrap();
        match reply {
            Reply::RoomCreated {
                room_code,
                game_config,
            } => {
                assert_eq!(game_config.digit_count, 4);
                assert_eq!(game_config.time_per_turn, Some(30));
                assert!(game_config.allow_duplicates);
                assert_eq!(alice.session.rooms().collect::<Vec<_>>(), vec![&room_code]);
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_join_unknown_or_malformed_room_is_not_found() {
        let (c, _) = coordinator();
        let mut bob = Client::new(2);
        bob.send(&c, auth("tok-bob")).await.unwrap();

        let err = bob.send(&c, join("ZZZ999")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::RoomNotFound);
        assert_eq!(err.client_message(), "Room not found");

        let err = bob.send(&c, join("not a code")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::RoomNotFound);
    }

    #[tokio::test]
    async fn test_join_returns_view_and_broadcasts() {
        let (c, _) = coordinator();
        let mut alice = Client::new(1);
        let mut bob = Client::new(2);
        alice.send(&c, auth("tok-alice")).await.unwrap();
        bob.send(&c, auth("tok-bob")).await.unwrap();
        let Reply::RoomCreated { room_code, .. } = alice.send(&c, create()).await.unwrap() else {
            panic!("expected room-created");
        };

        let reply = bob.send(&c, join(room_code.as_str())).await.unwrap();
        let Reply::RoomJoined { game } = reply else {
            panic!("expected room-joined");
        };
        assert_eq!(game.game_state, GameState::Ready);
        assert_eq!(game.players.len(), 2);

        for rx in [&mut alice.rx, &mut bob.rx] {
            match rx.try_recv().unwrap() {
                ServerMessage::Event(RoomEvent::RoomUpdated { players, .. }) => {
                    assert_eq!(players.len(), 2);
                }
                other => panic!("unexpected message {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_guess_flow_and_stats_hand_off() {
        let (c, stats) = coordinator();
        let mut alice = Client::new(1);
        let mut bob = Client::new(2);
        let code = start_match(&c, &mut alice, &mut bob).await;

        let err = bob.send(&c, guess(&code, "4096")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotYourTurn);

        let err = alice.send(&c, guess(&code, "12")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInputLength);

        let reply = alice.send(&c, guess(&code, "1243")).await.unwrap();
        assert_eq!(
            reply,
            Reply::GuessAccepted {
                feedback: vec![Verdict::Green, Verdict::Green, Verdict::Yellow, Verdict::Yellow],
                is_win: false,
            }
        );

        let reply = bob.send(&c, guess(&code, "4096")).await.unwrap();
        assert!(matches!(reply, Reply::GuessAccepted { is_win: true, .. }));

        // The stats task runs on its own; give it a moment.
        let bob_stats = tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                if let Some(s) = stats.stats_for(&UserId::from("bob")).await {
                    break s;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert_eq!((bob_stats.games_played, bob_stats.games_won), (1, 1));
        assert_eq!(bob_stats.total_guesses, 1);

        let alice_stats = stats.stats_for(&UserId::from("alice")).await.unwrap();
        assert_eq!((alice_stats.games_played, alice_stats.games_won), (1, 0));
        assert_eq!(alice_stats.current_win_streak, 0);
        assert_eq!(alice_stats.total_guesses, 0);

        let history = stats.history().await;
        assert_eq!(history[0].room_code.as_str(), code);
        assert_eq!(history[0].winner, UserId::from("bob"));
    }

    struct FailingStats;

    impl StatsRecorder for FailingStats {
        async fn record_game_result(&self, _: GameResult) -> Result<(), StatsError> {
            Err(StatsError::Unavailable("disk full".into()))
        }
    }

    #[tokio::test]
    async fn test_stats_failure_does_not_affect_result() {
        let identities = MemoryIdentityProvider::from_tokens([
            ("tok-alice".to_string(), identity("alice")),
            ("tok-bob".to_string(), identity("bob")),
        ]);
        let registry = Arc::new(RoomRegistry::new(RoomConfig::default()));
        let c = MatchCoordinator::new(registry, identities, Arc::new(FailingStats));
        let mut alice = Client::new(1);
        let mut bob = Client::new(2);
        let code = start_match(&c, &mut alice, &mut bob).await;

        let reply = alice.send(&c, guess(&code, "1234")).await.unwrap();
        assert!(matches!(reply, Reply::GuessAccepted { is_win: true, .. }));

        let handle = c.registry().get(&RoomCode::parse(&code).unwrap()).await.unwrap();
        let view = handle.snapshot().await.unwrap();
        assert_eq!(view.game_state, GameState::Finished);
        assert_eq!(view.winner, Some(UserId::from("alice")));
    }

    #[tokio::test]
    async fn test_release_stops_broadcasts_but_keeps_seat() {
        let (c, _) = coordinator();
        let mut alice = Client::new(1);
        let mut bob = Client::new(2);
        let code = start_match(&c, &mut alice, &mut bob).await;
        while bob.rx.try_recv().is_ok() {}

        let rooms = bob.session.take_rooms();
        c.release(bob.session.connection(), rooms).await;

        alice.send(&c, guess(&code, "5678")).await.unwrap();
        assert!(bob.rx.try_recv().is_err());

        // Bob comes back on a new connection and rejoins.
        let mut bob2 = Client::new(3);
        bob2.send(&c, auth("tok-bob")).await.unwrap();
        let Reply::RoomJoined { game } = bob2.send(&c, join(&code)).await.unwrap() else {
            panic!("expected room-joined");
        };
        assert_eq!(game.current_turn, Some(UserId::from("bob")));
        assert_eq!(game.players[0].guesses.len(), 1);
        assert!(bob2.send(&c, guess(&code, "4096")).await.is_ok());
    }

    #[tokio::test]
    async fn test_secret_errors_map_to_codes() {
        let (c, _) = coordinator();
        let mut alice = Client::new(1);
        let mut mallory = Client::new(9);
        alice.send(&c, auth("tok-alice")).await.unwrap();
        let Reply::RoomCreated { room_code, .. } = alice.send(&c, create()).await.unwrap() else {
            panic!("expected room-created");
        };
        let code = room_code.to_string();

        let err = alice.send(&c, secret(&code, "11x2")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidDigits);
        let err = alice.send(&c, secret(&code, "1122")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::DuplicateDigits);

        let p = MemoryIdentityProvider::new();
        let (guest_token, _) = p.issue_guest_session("mallory").await;
        let mc = MatchCoordinator::new(Arc::clone(c.registry()), p, Arc::new(MemoryStats::new()));
        mallory
            .send(
                &mc,
                Intent::Authenticate {
                    token: None,
                    guest_token: Some(guest_token),
                },
            )
            .await
            .unwrap();
        let err = mallory.send(&mc, secret(&code, "1234")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::PlayerNotInRoom);
    }
}

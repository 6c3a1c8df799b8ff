//! Room actor: an isolated Tokio task that owns one [`Room`].
//!
//! Every intent for a room travels through the actor's command channel and
//! is applied one at a time, so two joins (or a join and a guess) for the
//! same code can never interleave. Rooms don't share state with each other
//! and run in parallel.
//!
//! Besides commands, the actor's `select!` loop waits on two deadlines:
//! the Speed-mode turn timer (when enforced) and the room's expiry.

use std::collections::HashMap;

use numble_protocol::{
    GameConfig, GameState, Identity, RoomCode, RoomEvent, RoomView, ServerMessage, UserId,
};
use numble_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};

use crate::{GuessOutcome, JoinOutcome, Room, RoomConfig, RoomError};

/// Channel a connection's handler receives room broadcasts on.
pub type EventSender = mpsc::UnboundedSender<ServerMessage>;

/// Commands sent to a room actor through its channel.
///
/// Variants with a `reply` are request/response: the caller awaits the
/// oneshot.
pub(crate) enum RoomCommand {
    /// Seat a player (or re-seat a returning one) and subscribe the
    /// connection to broadcasts.
    Join {
        identity: Identity,
        connection: ConnectionId,
        events: EventSender,
        reply: oneshot::Sender<Result<RoomView, RoomError>>,
    },

    SubmitSecret {
        user_id: UserId,
        secret: String,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    SubmitGuess {
        user_id: UserId,
        guess: String,
        reply: oneshot::Sender<Result<GuessOutcome, RoomError>>,
    },

    /// Stop broadcasting to a connection. The player keeps their seat.
    Unsubscribe { connection: ConnectionId },

    Snapshot {
        reply: oneshot::Sender<RoomView>,
    },

    Shutdown,
}

/// Handle to a running room actor.
///
/// Cheap to clone; the [`RoomRegistry`](crate::RoomRegistry) keeps one per
/// live room and hands out copies. Every method reports
/// [`RoomError::RoomNotFound`] once the actor has stopped.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    config: GameConfig,
    expires_at: Instant,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// The parameters the room was created with.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Returns `true` while the room is reachable: not expired and its
    /// actor still running.
    pub fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at && !self.sender.is_closed()
    }

    /// Seats `identity` and subscribes `connection`. Returns the room as
    /// the caller now sees it.
    pub async fn join(
        &self,
        identity: Identity,
        connection: ConnectionId,
        events: EventSender,
    ) -> Result<RoomView, RoomError> {
        self.request(|reply| RoomCommand::Join {
            identity,
            connection,
            events,
            reply,
        })
        .await?
    }

    pub async fn submit_secret(&self, user_id: UserId, secret: String) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::SubmitSecret {
            user_id,
            secret,
            reply,
        })
        .await?
    }

    pub async fn submit_guess(
        &self,
        user_id: UserId,
        guess: String,
    ) -> Result<GuessOutcome, RoomError> {
        self.request(|reply| RoomCommand::SubmitGuess {
            user_id,
            guess,
            reply,
        })
        .await?
    }

    /// Stops broadcasts to `connection` (fire-and-forget).
    pub async fn unsubscribe(&self, connection: ConnectionId) -> Result<(), RoomError> {
        self.send(RoomCommand::Unsubscribe { connection }).await
    }

    /// The current public-safe view of the room.
    pub async fn snapshot(&self) -> Result<RoomView, RoomError> {
        self.request(|reply| RoomCommand::Snapshot { reply }).await
    }

    /// Tells the actor to stop.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::RoomNotFound(self.code.clone()))
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(make(reply_tx)).await?;
        reply_rx
            .await
            .map_err(|_| RoomError::RoomNotFound(self.code.clone()))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    enforce_turn_timer: bool,
    /// Connections receiving this room's broadcasts.
    subscribers: HashMap<ConnectionId, EventSender>,
    /// When the current player forfeits, if the turn timer is armed.
    turn_deadline: Option<Instant>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(
            room_code = %self.room.code(),
            mode = %self.room.config().mode,
            "room actor started"
        );

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle(cmd) {
                        tracing::info!(room_code = %self.room.code(), "room shutting down");
                        break;
                    }
                }
                () = wait_until(self.turn_deadline) => self.handle_turn_timeout(),
                () = time::sleep_until(self.room.expires_at()) => {
                    tracing::info!(
                        room_code = %self.room.code(),
                        state = %self.room.state(),
                        "room expired"
                    );
                    break;
                }
            }
        }

        tracing::info!(room_code = %self.room.code(), "room actor stopped");
    }

    /// Applies one command. Returns `false` when the actor should stop.
    fn handle(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                identity,
                connection,
                events,
                reply,
            } => {
                let result = self.handle_join(identity, connection, events);
                let _ = reply.send(result);
            }
            RoomCommand::SubmitSecret {
                user_id,
                secret,
                reply,
            } => {
                let result = self.handle_secret(&user_id, &secret);
                let _ = reply.send(result);
            }
            RoomCommand::SubmitGuess {
                user_id,
                guess,
                reply,
            } => {
                let result = self.handle_guess(user_id, guess);
                let _ = reply.send(result);
            }
            RoomCommand::Unsubscribe { connection } => {
                if self.subscribers.remove(&connection).is_some() {
                    tracing::debug!(
                        room_code = %self.room.code(),
                        conn_id = %connection,
                        "connection unsubscribed"
                    );
                }
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.room.view());
            }
            RoomCommand::Shutdown => return false,
        }
        true
    }

    fn handle_join(
        &mut self,
        identity: Identity,
        connection: ConnectionId,
        events: EventSender,
    ) -> Result<RoomView, RoomError> {
        let user_id = identity.user_id.clone();
        let outcome = self.room.join(identity)?;
        self.subscribers.insert(connection, events);

        match outcome {
            JoinOutcome::Seated => {
                tracing::info!(
                    room_code = %self.room.code(),
                    %user_id,
                    players = self.room.player_count(),
                    "player joined"
                );
                self.broadcast(RoomEvent::RoomUpdated {
                    room_code: self.room.code().clone(),
                    players: self.room.summaries(),
                    game_state: self.room.state(),
                    game_mode: self.room.config().mode,
                });
            }
            JoinOutcome::AlreadySeated => {
                tracing::debug!(
                    room_code = %self.room.code(),
                    %user_id,
                    conn_id = %connection,
                    "player rejoined"
                );
            }
        }
        Ok(self.room.view())
    }

    fn handle_secret(&mut self, user_id: &UserId, secret: &str) -> Result<(), RoomError> {
        let started = self.room.submit_secret(user_id, secret)?;
        tracing::debug!(room_code = %self.room.code(), %user_id, "secret accepted");

        if started {
            self.arm_turn_timer();
            if let Some(current_turn) = self.turn_user() {
                tracing::info!(
                    room_code = %self.room.code(),
                    first = %current_turn,
                    "game started"
                );
                self.broadcast(RoomEvent::GameStarted {
                    room_code: self.room.code().clone(),
                    game_state: self.room.state(),
                    current_turn,
                });
            }
        }
        Ok(())
    }

    fn handle_guess(&mut self, user_id: UserId, guess: String) -> Result<GuessOutcome, RoomError> {
        let outcome = self.room.submit_guess(&user_id, &guess)?;

        if outcome.is_win {
            self.turn_deadline = None;
            tracing::info!(
                room_code = %self.room.code(),
                winner = %user_id,
                "game finished"
            );
        } else {
            self.arm_turn_timer();
        }

        let view = self.room.view();
        self.broadcast(RoomEvent::GuessReceived {
            room_code: self.room.code().clone(),
            player_id: user_id,
            guess_number: guess,
            feedback: outcome.feedback.clone(),
            game_state: view.game_state,
            winner: view.winner,
            current_turn: view.current_turn,
        });
        Ok(outcome)
    }

    fn handle_turn_timeout(&mut self) {
        self.turn_deadline = None;
        let Some(seat) = self.room.forfeit_turn() else {
            return;
        };
        let (Some(player_id), Some(current_turn)) =
            (self.room.user_at(seat).cloned(), self.turn_user())
        else {
            return;
        };

        tracing::info!(
            room_code = %self.room.code(),
            %player_id,
            "turn timed out"
        );
        self.arm_turn_timer();
        self.broadcast(RoomEvent::TurnForfeited {
            room_code: self.room.code().clone(),
            player_id,
            current_turn,
        });
    }

    fn arm_turn_timer(&mut self) {
        self.turn_deadline = match self.room.time_per_turn() {
            Some(limit) if self.enforce_turn_timer && self.room.state() == GameState::Playing => {
                Some(Instant::now() + limit)
            }
            _ => None,
        };
    }

    fn turn_user(&self) -> Option<UserId> {
        self.room
            .current_turn()
            .and_then(|seat| self.room.user_at(seat).cloned())
    }

    /// Sends `event` to every subscriber, dropping the ones whose
    /// connection has gone away.
    fn broadcast(&mut self, event: RoomEvent) {
        let msg = ServerMessage::Event(event);
        self.subscribers.retain(|_, tx| tx.send(msg.clone()).is_ok());
    }
}

/// Sleeps until `deadline`, or forever when there is none.
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Spawns the actor for `room` with its creator's connection already
/// subscribed, and returns a handle to it.
pub(crate) fn spawn_room(
    room: Room,
    config: &RoomConfig,
    connection: ConnectionId,
    events: EventSender,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size);

    let handle = RoomHandle {
        code: room.code().clone(),
        config: room.config().clone(),
        expires_at: room.expires_at(),
        sender: tx,
    };

    let actor = RoomActor {
        room,
        enforce_turn_timer: config.enforce_turn_timer,
        subscribers: HashMap::from([(connection, events)]),
        turn_deadline: None,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    handle
}

//! Room registry: owns which room codes exist.
//!
//! Creation checks the code against live rooms and inserts under one lock,
//! so two creates can never hand out the same code. Lookups clone the
//! handle and release the lock before talking to the room, so a slow room
//! never holds up the registry.

use std::collections::HashMap;
use std::sync::Arc;

use numble_protocol::{GameConfig, GameMode, Identity, RoomCode};
use numble_transport::ConnectionId;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::actor::spawn_room;
use crate::codegen::generate_room_code;
use crate::{EventSender, Room, RoomConfig, RoomError, RoomHandle};

type CodeSource = Box<dyn Fn() -> String + Send + Sync>;

/// Every live room, keyed by code.
pub struct RoomRegistry {
    config: RoomConfig,
    rooms: Mutex<HashMap<RoomCode, RoomHandle>>,
    next_code: CodeSource,
}

impl RoomRegistry {
    /// Creates an empty registry drawing random codes.
    pub fn new(config: RoomConfig) -> Self {
        Self::with_code_source(config, generate_room_code)
    }

    /// Creates an empty registry drawing codes from `source`.
    ///
    /// Candidates that aren't valid room codes are skipped like collisions.
    pub fn with_code_source(
        config: RoomConfig,
        source: impl Fn() -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            config,
            rooms: Mutex::new(HashMap::new()),
            next_code: Box::new(source),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Opens a room with `creator` seated and `connection` subscribed.
    ///
    /// # Errors
    /// [`RoomError::CodeSpaceExhausted`] if `max_code_attempts` candidates
    /// all collided with live rooms.
    pub async fn create(
        &self,
        creator: Identity,
        mode: GameMode,
        allow_duplicates: bool,
        connection: ConnectionId,
        events: EventSender,
    ) -> Result<RoomHandle, RoomError> {
        let mut rooms = self.rooms.lock().await;
        let now = Instant::now();

        for _ in 0..self.config.max_code_attempts {
            let Ok(code) = RoomCode::parse(&(self.next_code)()) else {
                continue;
            };
            if rooms.get(&code).is_some_and(|h| h.is_live(now)) {
                tracing::debug!(room_code = %code, "room code collision, re-rolling");
                continue;
            }

            let user_id = creator.user_id.clone();
            let config = GameConfig::new(mode, allow_duplicates);
            let room = Room::new(code.clone(), creator, config, self.config.ttl);
            let handle = spawn_room(room, &self.config, connection, events);
            rooms.insert(code.clone(), handle.clone());

            tracing::info!(room_code = %code, %user_id, %mode, "room created");
            return Ok(handle);
        }

        tracing::error!(
            attempts = self.config.max_code_attempts,
            "room code space exhausted"
        );
        Err(RoomError::CodeSpaceExhausted)
    }

    /// Looks up a live room. An expired or stopped room is evicted on the
    /// spot and reported as not found.
    pub async fn get(&self, code: &RoomCode) -> Result<RoomHandle, RoomError> {
        let mut rooms = self.rooms.lock().await;
        match rooms.get(code) {
            Some(handle) if handle.is_live(Instant::now()) => Ok(handle.clone()),
            Some(_) => {
                rooms.remove(code);
                tracing::info!(room_code = %code, "room evicted on lookup");
                Err(RoomError::RoomNotFound(code.clone()))
            }
            None => Err(RoomError::RoomNotFound(code.clone())),
        }
    }

    /// Drops every expired or stopped room. Returns how many went.
    pub async fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut rooms = self.rooms.lock().await;
        let before = rooms.len();
        rooms.retain(|_, handle| handle.is_live(now));
        let evicted = before - rooms.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = rooms.len(), "expired rooms swept");
        }
        evicted
    }

    /// Starts a background task that calls [`evict_expired`](Self::evict_expired)
    /// every `sweep_interval`. The task ends once the registry is dropped.
    pub fn spawn_reaper(self: &Arc<Self>) -> JoinHandle<()> {
        let registry = Arc::downgrade(self);
        let period = self.config.sweep_interval;

        tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                registry.evict_expired().await;
            }
        })
    }

    /// Number of rooms currently tracked, including any not yet swept.
    pub async fn len(&self) -> usize {
        self.rooms.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

//! `NumbleServer` builder and server loop.
//!
//! This is the entry point for running a Numble game server. It ties
//! together all the layers: transport → protocol → session → room.

use std::sync::Arc;
use std::time::Duration;

use numble_protocol::{Codec, JsonCodec};
use numble_room::{RoomConfig, RoomRegistry};
use numble_session::{IdentityProvider, MemoryIdentityProvider};
use numble_transport::{Transport, WebSocketTransport};
use tokio::task::JoinHandle;

use crate::config::ServerConfig;
use crate::coordinator::MatchCoordinator;
use crate::handler::handle_connection;
use crate::stats::{MemoryStats, StatsRecorder};
use crate::NumbleError;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<P, S, C> {
    pub(crate) coordinator: MatchCoordinator<P, S>,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a Numble server.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use numble::prelude::*;
///
/// # async fn run() -> Result<(), NumbleError> {
/// let server = NumbleServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(MemoryIdentityProvider::new(), Arc::new(MemoryStats::new()))
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct NumbleServerBuilder {
    config: ServerConfig,
}

impl NumbleServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the room settings.
    pub fn room_config(mut self, rooms: RoomConfig) -> Self {
        self.config.rooms = rooms;
        self
    }

    /// Binds the listener and starts the room reaper.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<P, S>(
        self,
        identities: P,
        stats: Arc<S>,
    ) -> Result<NumbleServer<P, S, JsonCodec>, NumbleError>
    where
        P: IdentityProvider,
        S: StatsRecorder,
    {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let registry = Arc::new(RoomRegistry::new(self.config.rooms.clone()));
        let reaper = registry.spawn_reaper();

        let state = Arc::new(ServerState {
            coordinator: MatchCoordinator::new(registry, identities, stats),
            codec: JsonCodec,
            idle_timeout: self.config.idle_timeout,
        });

        Ok(NumbleServer {
            transport,
            state,
            reaper,
        })
    }
}

impl Default for NumbleServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Numble game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct NumbleServer<P, S, C> {
    transport: WebSocketTransport,
    state: Arc<ServerState<P, S, C>>,
    reaper: JoinHandle<()>,
}

impl NumbleServer<MemoryIdentityProvider, MemoryStats, JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> NumbleServerBuilder {
        NumbleServerBuilder::new()
    }
}

impl<P, S, C> NumbleServer<P, S, C>
where
    P: IdentityProvider,
    S: StatsRecorder,
    C: Codec + Clone,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The registry holding this server's rooms.
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        self.state.coordinator.registry()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), NumbleError> {
        tracing::info!("Numble server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

impl<P, S, C> Drop for NumbleServer<P, S, C> {
    fn drop(&mut self) {
        self.reaper.abort();
    }
}

//! Per-connection handler: decode intents, dispatch, write replies and
//! room events.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Spawn a writer task draining the connection's outbound queue
//!   2. Loop: receive a frame → decode → dispatch → enqueue the reply
//!      (any inbound frame, keepalives included, restarts the idle timer)
//!   3. On exit, the guard unsubscribes the connection from its rooms
//!
//! Replies and room events share one queue, so the client sees them in the
//! order the rooms produced them.

use std::sync::Arc;

use numble_protocol::{ClientEnvelope, Codec, ServerMessage};
use numble_session::{IdentityProvider, SessionBinding};
use numble_transport::{Connection, Inbound, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::stats::StatsRecorder;
use crate::NumbleError;

/// Owns the connection's session and releases its room subscriptions when
/// the handler exits, even on an early return.
///
/// Since `Drop` is synchronous, the release runs on a spawned task.
struct ConnectionGuard<P: IdentityProvider, S: StatsRecorder, C: Codec> {
    session: SessionBinding,
    state: Arc<ServerState<P, S, C>>,
}

impl<P: IdentityProvider, S: StatsRecorder, C: Codec> Drop for ConnectionGuard<P, S, C> {
    fn drop(&mut self) {
        let rooms = self.session.take_rooms();
        if rooms.is_empty() {
            return;
        }
        let connection = self.session.connection();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.coordinator.release(connection, rooms).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<P, S, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<P, S, C>>,
) -> Result<(), NumbleError>
where
    P: IdentityProvider,
    S: StatsRecorder,
    C: Codec + Clone,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::info!(%conn_id, peer = %conn.peer_addr(), "connection opened");

    let (outbound, queue) = mpsc::unbounded_channel();
    let mut writer = tokio::spawn(write_loop(Arc::clone(&conn), state.codec.clone(), queue));

    let mut guard = ConnectionGuard {
        session: SessionBinding::new(conn_id),
        state: Arc::clone(&state),
    };

    loop {
        let frame = tokio::select! {
            frame = tokio::time::timeout(state.idle_timeout, conn.recv()) => frame,
            _ = &mut writer => {
                tracing::debug!(%conn_id, "writer stopped");
                break;
            }
        };

        let data = match frame {
            Ok(Ok(Some(Inbound::Frame(data)))) => data,
            // Pings and pongs count as activity; the idle timer restarts.
            Ok(Ok(Some(Inbound::KeepAlive))) => {
                tracing::trace!(%conn_id, "keepalive");
                continue;
            }
            Ok(Ok(None)) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%conn_id, "connection idle, closing");
                break;
            }
        };

        let envelope: ClientEnvelope = match state.codec.decode(&data) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "ignoring malformed frame");
                continue;
            }
        };

        let request_id = envelope.request_id;
        let intent = envelope.intent.name();
        let reply = match state
            .coordinator
            .dispatch(&mut guard.session, &outbound, envelope.intent)
            .await
        {
            Ok(reply) => ServerMessage::ok(request_id, reply),
            Err(e) => {
                tracing::debug!(%conn_id, request_id, intent, error = %e, "intent rejected");
                ServerMessage::failure(request_id, e.code(), e.client_message())
            }
        };

        if outbound.send(reply).is_err() {
            break;
        }
    }

    writer.abort();
    let _ = conn.close().await;
    // guard drops here → room subscriptions released.
    Ok(())
}

/// Encodes and sends everything queued for this connection, in order.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    codec: C,
    mut queue: mpsc::UnboundedReceiver<ServerMessage>,
) -> Result<(), NumbleError> {
    while let Some(msg) = queue.recv().await {
        let bytes = codec.encode(&msg)?;
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed");
            return Err(e.into());
        }
    }
    Ok(())
}

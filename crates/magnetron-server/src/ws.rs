//! `WebSocket` handler for real-time snapshot streaming.
//!
//! Clients connect to `GET /ws/microwave` and receive a JSON-encoded
//! [`Snapshot`] immediately on connect, then one per state change
//! (including ticker-driven countdowns). The handler subscribes to the
//! instance's broadcast channel *before* pulling the initial snapshot,
//! so a mutation landing between the two is not lost -- a new viewer is
//! never left blank or stale.
//!
//! A send failure or close frame tears down only this connection; every
//! other viewer keeps its stream. If a client falls behind, lagged
//! snapshots are silently skipped and the client resumes from the most
//! recent one.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use magnetron_types::Snapshot;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming snapshots.
///
/// # Route
///
/// `GET /ws/microwave`
pub async fn ws_microwave(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Handle the `WebSocket` lifecycle: push the current snapshot, then
/// forward every broadcast snapshot as a text frame.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket viewer connected");

    // Subscribe before the initial pull so an update published in
    // between is delivered rather than lost.
    let mut rx = state.subscribe();

    match state.engine.get().await {
        Ok(snapshot) => {
            if send_snapshot(&mut socket, &snapshot).await.is_err() {
                debug!("WebSocket viewer disconnected (initial send failed)");
                return;
            }
        }
        Err(e) => {
            warn!(error = %e, "Initial snapshot unavailable, closing socket");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    }

    loop {
        tokio::select! {
            // Receive a snapshot relayed from the store's updates channel.
            result = rx.recv() => {
                match result {
                    Ok(snapshot) => {
                        if send_snapshot(&mut socket, &snapshot).await.is_err() {
                            debug!("WebSocket viewer disconnected (send failed)");
                            return;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket viewer lagged, skipping ahead");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        debug!("Broadcast channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            // Check if the client sent a close frame or disconnected.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket viewer disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let pong = Message::Pong(data);
                        if socket.send(pong).await.is_err() {
                            debug!("WebSocket viewer disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {
                        // Ignore other message types (text, binary from client).
                    }
                }
            }
        }
    }
}

/// Serialize a snapshot and send it as one text frame.
async fn send_snapshot(socket: &mut WebSocket, snapshot: &Snapshot) -> Result<(), ()> {
    let json = match serde_json::to_string(snapshot) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize snapshot: {e}");
            // Serialization never fails for this type; keep the
            // connection alive rather than dropping the viewer.
            return Ok(());
        }
    };
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

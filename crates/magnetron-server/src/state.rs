//! Shared application state for the API server.
//!
//! [`AppState`] holds this instance's handle on the state engine, the
//! credential guard, and the broadcast channel that fans published
//! snapshots out to the instance's `WebSocket` connections. It holds no
//! authoritative appliance state: the external store owns that, and
//! anything cached here is a transient view.

use magnetron_core::StateEngine;
use magnetron_types::Snapshot;
use tokio::sync::broadcast;

use crate::auth::AuthGuard;

/// Capacity of the broadcast channel for snapshot updates.
///
/// If a connection falls behind by more than this many messages it
/// receives a [`broadcast::error::RecvError::Lagged`] and skips to the
/// newest snapshot, which is exactly the state it should be showing.
const BROADCAST_CAPACITY: usize = 256;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor. The broadcast sender is fed by the [`hub`](crate::hub)
/// relay with every snapshot published on the store's updates channel,
/// regardless of which instance performed the mutation.
#[derive(Clone)]
pub struct AppState {
    /// The state engine every handler mutates and reads through.
    pub engine: StateEngine,
    /// The credential guard for the cancel action.
    pub auth: AuthGuard,
    /// Broadcast sender for snapshot updates.
    tx: broadcast::Sender<Snapshot>,
}

impl AppState {
    /// Create the application state for one service instance.
    pub fn new(engine: StateEngine, auth: AuthGuard) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { engine, auth, tx }
    }

    /// Subscribe to this instance's snapshot broadcast.
    ///
    /// Returns a receiver yielding one [`Snapshot`] per state change,
    /// in publication order.
    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// Push a snapshot to every connection on this instance.
    ///
    /// Returns the number of receivers that got the message. Returns 0
    /// if no viewer is connected (this is not an error).
    pub fn broadcast(&self, snapshot: Snapshot) -> usize {
        // send returns Err only when there are zero receivers, which is
        // normal when no WebSocket clients are connected.
        self.tx.send(snapshot).unwrap_or(0)
    }
}

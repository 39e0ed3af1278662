//! Cross-instance snapshot relay.
//!
//! Each service instance runs exactly one relay task. It holds a
//! dedicated subscriber connection on the store's updates channel and
//! forwards every decoded snapshot into the instance's broadcast
//! channel, where the per-connection `WebSocket` tasks pick it up. This
//! is what makes fan-out cross-instance: a mutation performed on any
//! instance is published once to the store and every instance's relay
//! delivers it to its own viewers.
//!
//! The underlying subscription survives store reconnects; the relay
//! only exits when the subscriber connection is gone for good.

use std::sync::Arc;

use magnetron_store::{StoreError, UpdateStream};
use tokio::task::JoinHandle;
use tracing::{error, info, trace};

use crate::state::AppState;

/// Subscribe to the store's updates channel and spawn the relay task.
///
/// # Errors
///
/// Returns [`StoreError`] if the subscriber connection cannot be
/// established.
pub async fn spawn_relay(state: Arc<AppState>) -> Result<JoinHandle<()>, StoreError> {
    let stream = state.engine.pool().subscribe_updates().await?;
    Ok(tokio::spawn(run_relay(stream, state)))
}

/// Forward published snapshots into this instance's broadcast channel
/// until the subscription closes.
async fn run_relay(mut stream: UpdateStream, state: Arc<AppState>) {
    info!("Snapshot relay started");
    loop {
        match stream.recv().await {
            Ok(snapshot) => {
                let receivers = state.broadcast(snapshot);
                trace!(
                    power = snapshot.power,
                    counter = snapshot.counter,
                    receivers,
                    "Relayed snapshot"
                );
            }
            Err(e) => {
                error!(error = %e, "Update subscription closed, relay stopping");
                return;
            }
        }
    }
}

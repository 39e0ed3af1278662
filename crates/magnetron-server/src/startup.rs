//! Server startup helper for the service binary.
//!
//! Provides [`spawn_server`] which launches the HTTP + `WebSocket`
//! server on a background Tokio task. The service binary calls this
//! during startup so the API runs concurrently with the relay and the
//! ticker loop.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the API server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Spawn the API server on a background Tokio task.
///
/// Returns a [`JoinHandle`] so the caller can manage the server's
/// lifecycle alongside the relay and ticker tasks. The server runs
/// until the Tokio runtime is shut down or the task is aborted.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the configured address is not
/// resolvable. Bind failures surface asynchronously from the spawned
/// task's logs.
pub async fn spawn_server(
    config: ServerConfig,
    state: Arc<AppState>,
) -> Result<JoinHandle<()>, StartupError> {
    // Catch obvious misconfigurations before spawning; the actual bind
    // happens inside start_server.
    let addr = config.bind_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = crate::server::start_server(&config, state).await {
            tracing::error!(error = %e, "API server exited with error");
        }
    });

    tracing::info!(%addr, "API server spawned on background task");

    Ok(handle)
}

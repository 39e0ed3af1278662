//! Service binary for the Magnetron shared microwave.
//!
//! This is the main entry point that wires together the state store,
//! the state engine, the cross-instance snapshot relay, the
//! lease-elected countdown ticker, and the HTTP + `WebSocket` API
//! server. Any number of these binaries can run behind a load balancer
//! against one store; state stays consistent because every mutation is
//! store-side atomic and exactly one instance holds the ticker lease.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `magnetron.yaml` + environment overrides
//! 3. Connect to the state store
//! 4. Build the state engine and credential guard
//! 5. Spawn the snapshot relay (store pub/sub -> local broadcast)
//! 6. Spawn the ticker (if enabled for this instance)
//! 7. Spawn the API server
//! 8. Wait for Ctrl-C, then shut the ticker down cleanly so its lease
//!    is released for a peer to take over

mod error;

use std::path::Path;
use std::sync::Arc;

use magnetron_core::{ServiceConfig, StateEngine, Ticker};
use magnetron_server::{AppState, AuthGuard, ServerConfig};
use magnetron_store::{StorePool, TickerLease};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::error::ServiceError;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("magnetron-service starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        host = config.server.host,
        port = config.server.port,
        redis_url = config.store.redis_url,
        tick_interval_ms = config.ticker.tick_interval_ms,
        ticker_enabled = config.ticker.enabled,
        "Configuration loaded"
    );

    if config.auth.secret_key.is_empty() {
        return Err(ServiceError::MissingSecret.into());
    }

    // 3. Connect to the state store.
    let pool = StorePool::connect(&config.store.redis_url, config.store.command_timeout())
        .await
        .map_err(ServiceError::from)?;

    // 4. Build the engine and the credential guard.
    let engine = StateEngine::new(pool.clone());
    let auth = AuthGuard::new(&config.auth.secret_key);
    let app_state = Arc::new(AppState::new(engine.clone(), auth));

    // 5. Spawn the snapshot relay.
    let _relay_handle = magnetron_server::hub::spawn_relay(Arc::clone(&app_state))
        .await
        .map_err(ServiceError::from)?;

    // 6. Spawn the ticker.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ticker_handle = if config.ticker.enabled {
        let instance_id = Uuid::now_v7().to_string();
        let lease = TickerLease::new(&pool, instance_id.clone(), config.ticker.lease_ttl());
        let ticker = Ticker::new(engine, lease, config.ticker.tick_interval());
        let handle = tokio::spawn(ticker.run(shutdown_rx));
        info!(instance_id, "Ticker task started");
        Some(handle)
    } else {
        info!("Ticker disabled for this instance");
        None
    };

    // 7. Spawn the API server.
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let server_handle =
        magnetron_server::spawn_server(server_config, Arc::clone(&app_state))
            .await
            .map_err(ServiceError::from)?;

    // 8. Run until interrupted.
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    // Stop the ticker first so its lease is released while the store
    // connection is still up.
    let _ = shutdown_tx.send(true);
    if let Some(handle) = ticker_handle {
        let _ = handle.await;
    }
    server_handle.abort();

    info!("magnetron-service stopped");
    Ok(())
}

/// Load configuration from `magnetron.yaml`, falling back to defaults
/// (plus environment overrides) when the file does not exist.
fn load_config() -> Result<ServiceConfig, ServiceError> {
    let path = Path::new("magnetron.yaml");
    if path.exists() {
        Ok(ServiceConfig::from_file(path)?)
    } else {
        info!("magnetron.yaml not found, using defaults and environment overrides");
        Ok(ServiceConfig::parse("")?)
    }
}

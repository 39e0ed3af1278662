//! Axum router construction for the microwave API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin viewer access.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the service.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /microwave` -- current snapshot
/// - `POST /microwave/power/increase` / `decrease` -- power mutations
/// - `POST /microwave/counter/increase` / `decrease` -- counter mutations
/// - `POST /microwave/cancel` -- credential-gated reset
/// - `GET /ws/microwave` -- `WebSocket` snapshot stream
///
/// CORS is configured to allow any origin for development. In
/// production this should be restricted.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // Pull read
        .route("/microwave", get(handlers::get_microwave))
        // Mutations
        .route("/microwave/power/increase", post(handlers::increase_power))
        .route("/microwave/power/decrease", post(handlers::decrease_power))
        .route(
            "/microwave/counter/increase",
            post(handlers::increase_counter),
        )
        .route(
            "/microwave/counter/decrease",
            post(handlers::decrease_counter),
        )
        .route("/microwave/cancel", post(handlers::cancel))
        // WebSocket
        .route("/ws/microwave", get(ws::ws_microwave))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

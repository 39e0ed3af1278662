//! REST endpoint handlers for the microwave API.
//!
//! Every handler goes through the shared [`StateEngine`]; none of them
//! touch in-process state or perform read-modify-write sequences. Each
//! mutation returns the post-mutation snapshot, identical in shape to
//! the pull response and the `WebSocket` frames.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/microwave` | Current snapshot |
//! | `POST` | `/microwave/power/increase` | Power +10, clamped at 100 |
//! | `POST` | `/microwave/power/decrease` | Power -10, clamped at 0 |
//! | `POST` | `/microwave/counter/increase` | Counter +10 seconds |
//! | `POST` | `/microwave/counter/decrease` | Counter -10, clamped at 0 |
//! | `POST` | `/microwave/cancel` | Reset to zero (bearer credential) |
//!
//! [`StateEngine`]: magnetron_core::StateEngine

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse};
use axum::Json;
use magnetron_types::Snapshot;
use tracing::{debug, info};

use crate::auth::{self, AuthError};
use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the current state and API links.
///
/// The real viewer UI is out of scope for this service; this page is a
/// human-readable health check.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (power, counter, status) = match state.engine.get().await {
        Ok(snapshot) => (
            snapshot.power.to_string(),
            snapshot.counter.to_string(),
            snapshot.status.to_string(),
        ),
        Err(_) => (
            String::from("?"),
            String::from("?"),
            String::from("STORE UNREACHABLE"),
        ),
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Magnetron</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 640px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Magnetron</h1>
    <p class="subtitle">Shared microwave state service</p>

    <div>
        <div class="metric">
            <div class="label">Power</div>
            <div class="value">{power}</div>
        </div>
        <div class="metric">
            <div class="label">Counter</div>
            <div class="value">{counter}</div>
        </div>
        <div class="metric">
            <div class="label">Status</div>
            <div class="value">{status}</div>
        </div>
    </div>

    <hr>

    <ul>
        <li>GET /microwave</li>
        <li>POST /microwave/power/increase</li>
        <li>POST /microwave/power/decrease</li>
        <li>POST /microwave/counter/increase</li>
        <li>POST /microwave/counter/decrease</li>
        <li>POST /microwave/cancel</li>
        <li>GET /ws/microwave</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /microwave -- pull read
// ---------------------------------------------------------------------------

/// Return the current snapshot.
pub async fn get_microwave(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Snapshot>, ApiError> {
    Ok(Json(state.engine.get().await?))
}

// ---------------------------------------------------------------------------
// POST /microwave/... -- mutations
// ---------------------------------------------------------------------------

/// Increase microwave power by 10, clamped at 100.
pub async fn increase_power(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Snapshot>, ApiError> {
    Ok(Json(state.engine.increase_power().await?))
}

/// Decrease microwave power by 10, clamped at 0.
pub async fn decrease_power(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Snapshot>, ApiError> {
    Ok(Json(state.engine.decrease_power().await?))
}

/// Increase the microwave counter by 10 seconds.
pub async fn increase_counter(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Snapshot>, ApiError> {
    Ok(Json(state.engine.increase_counter().await?))
}

/// Decrease the microwave counter by 10 seconds, clamped at 0.
pub async fn decrease_counter(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Snapshot>, ApiError> {
    Ok(Json(state.engine.decrease_counter().await?))
}

/// Cancel microwave operation: reset power and counter to zero.
///
/// The only credential-gated action. The guard runs before the engine
/// is touched, so a rejected call mutates nothing and publishes
/// nothing.
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Snapshot>, ApiError> {
    let token = auth::bearer_token(&headers).ok_or(AuthError::MissingCredential)?;
    let claims = state.auth.verify(token).inspect_err(|e| {
        debug!(error = %e, "Cancel rejected");
    })?;

    info!(subject = claims.sub, "Cancel authorized");
    Ok(Json(state.engine.cancel().await?))
}

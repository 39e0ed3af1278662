//! HTTP + WebSocket API server for the Magnetron microwave service.
//!
//! This crate provides an Axum server that exposes:
//!
//! - **REST mutations** (`POST /microwave/...`) for the power and
//!   counter adjustments and the credential-gated cancel
//! - **Pull reads** (`GET /microwave`) returning the current snapshot
//! - **`WebSocket` endpoint** (`/ws/microwave`) pushing a snapshot on
//!   connect and after every state change, via
//!   [`tokio::sync::broadcast`]
//! - **Minimal HTML status page** (`GET /`) showing the current state
//!   and API links
//!
//! # Architecture
//!
//! Handlers never touch in-process authoritative state; every read and
//! mutation goes through the [`StateEngine`](magnetron_core::StateEngine)
//! to the external store. Real-time fan-out is cross-instance: the
//! [`hub`] relay subscribes to the store's updates channel and forwards
//! each published snapshot into this instance's broadcast channel, so
//! viewers attached to any instance see every change no matter where it
//! originated.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use auth::{AuthGuard, Claims};
pub use error::ApiError;
pub use router::build_router;
pub use server::{start_server, ServerConfig, ServerError};
pub use startup::spawn_server;
pub use state::AppState;

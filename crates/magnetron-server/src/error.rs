//! Error types for the API layer.
//!
//! [`ApiError`] unifies the user-visible failure modes into a single
//! enum that converts into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.
//! Rejections leave state unchanged and are never retried on the
//! caller's behalf.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::auth::AuthError;
use magnetron_core::EngineError;

/// Errors surfaced to API callers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The cancel credential is absent, malformed, badly signed, or
    /// expired. The state engine was never invoked.
    #[error("unauthorized: {source}")]
    Unauthorized {
        /// The underlying credential failure.
        #[from]
        source: AuthError,
    },

    /// The state store is unreachable or timed out; no partial state
    /// change was applied.
    #[error("{source}")]
    StoreUnavailable {
        /// The underlying engine error.
        #[from]
        source: EngineError,
    },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Unauthorized { source } => (StatusCode::UNAUTHORIZED, format!("{source}")),
            Self::StoreUnavailable { source } => {
                (StatusCode::SERVICE_UNAVAILABLE, format!("{source}"))
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

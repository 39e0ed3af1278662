//! Integration tests for the API endpoints against a live store.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server, but require a live Redis-compatible instance
//! behind the state engine. Run with:
//!
//! ```bash
//! docker run --rm -d -p 6379:6379 redis:7-alpine
//! cargo test -p magnetron-server -- --ignored --test-threads=1
//! ```

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use magnetron_core::StateEngine;
use magnetron_server::auth::mint_token;
use magnetron_server::{build_router, AppState, AuthGuard};
use magnetron_store::StorePool;
use serde_json::{json, Value};
use tower::ServiceExt;

const REDIS_URL: &str = "redis://localhost:6379";
const TIMEOUT: Duration = Duration::from_secs(2);
const SECRET: &str = "api-test-secret";

async fn make_test_state() -> Arc<AppState> {
    let pool = StorePool::connect(REDIS_URL, TIMEOUT)
        .await
        .expect("Failed to connect to Redis -- is Docker running?");
    pool.flush_all().await.expect("Failed to flush");
    Arc::new(AppState::new(
        StateEngine::new(pool),
        AuthGuard::new(SECRET),
    ))
}

async fn request(state: &Arc<AppState>, method: &str, path: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = builder.body(Body::empty()).unwrap();

    let response = build_router(Arc::clone(state))
        .oneshot(request)
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
#[ignore = "requires live Redis instance"]
async fn get_state_starts_at_zero() {
    let state = make_test_state().await;

    let (status, body) = request(&state, "GET", "/microwave", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"power": 0, "counter": 0, "status": "Off"}));
}

#[tokio::test]
#[ignore = "requires live Redis instance"]
async fn increase_power_steps_by_ten() {
    let state = make_test_state().await;

    let (status, body) = request(&state, "POST", "/microwave/power/increase", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"power": 10, "counter": 0, "status": "On"}));

    let (status, body) = request(&state, "POST", "/microwave/power/increase", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"power": 20, "counter": 0, "status": "On"}));
}

#[tokio::test]
#[ignore = "requires live Redis instance"]
async fn decrease_power_clamps_at_zero() {
    let state = make_test_state().await;

    // Seed power to 20 through the API.
    let _ = request(&state, "POST", "/microwave/power/increase", None).await;
    let _ = request(&state, "POST", "/microwave/power/increase", None).await;

    let (_, body) = request(&state, "POST", "/microwave/power/decrease", None).await;
    assert_eq!(body, json!({"power": 10, "counter": 0, "status": "On"}));

    let (_, body) = request(&state, "POST", "/microwave/power/decrease", None).await;
    assert_eq!(body, json!({"power": 0, "counter": 0, "status": "Off"}));

    // One more decrease stays clamped; power cannot go negative.
    let (status, body) = request(&state, "POST", "/microwave/power/decrease", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"power": 0, "counter": 0, "status": "Off"}));
}

#[tokio::test]
#[ignore = "requires live Redis instance"]
async fn counter_steps_and_clamps_at_zero() {
    let state = make_test_state().await;

    let (_, body) = request(&state, "POST", "/microwave/counter/increase", None).await;
    assert_eq!(body, json!({"power": 0, "counter": 10, "status": "On"}));

    let (_, body) = request(&state, "POST", "/microwave/counter/increase", None).await;
    assert_eq!(body, json!({"power": 0, "counter": 20, "status": "On"}));

    let (_, body) = request(&state, "POST", "/microwave/counter/decrease", None).await;
    assert_eq!(body, json!({"power": 0, "counter": 10, "status": "On"}));

    // Two more decreases clamp at zero rather than going negative.
    let _ = request(&state, "POST", "/microwave/counter/decrease", None).await;
    let (_, body) = request(&state, "POST", "/microwave/counter/decrease", None).await;
    assert_eq!(body, json!({"power": 0, "counter": 0, "status": "Off"}));
}

#[tokio::test]
#[ignore = "requires live Redis instance"]
async fn cancel_requires_a_valid_credential() {
    let state = make_test_state().await;

    // Seed some state to prove rejection leaves it untouched.
    let _ = request(&state, "POST", "/microwave/power/increase", None).await;
    let _ = request(&state, "POST", "/microwave/counter/increase", None).await;

    // No token.
    let (status, body) = request(&state, "POST", "/microwave/cancel", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body.get("status"), Some(&json!(401)));

    // Token signed with the wrong secret.
    let forged = mint_token("wrong-secret", "testuser", Duration::from_secs(60)).unwrap();
    let (status, _) = request(&state, "POST", "/microwave/cancel", Some(&forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The rejected calls mutated nothing.
    let (_, body) = request(&state, "GET", "/microwave", None).await;
    assert_eq!(body, json!({"power": 10, "counter": 10, "status": "On"}));

    // A valid token resets both fields.
    let token = mint_token(SECRET, "testuser", Duration::from_secs(60)).unwrap();
    let (status, body) = request(&state, "POST", "/microwave/cancel", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"power": 0, "counter": 0, "status": "Off"}));
}

#[tokio::test]
#[ignore = "requires live Redis instance"]
async fn unknown_routes_are_not_found() {
    let state = make_test_state().await;

    let (status, _) = request(&state, "GET", "/microwave/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Mutations are POST-only.
    let (status, _) = request(&state, "GET", "/microwave/power/increase", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

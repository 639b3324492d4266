//! API endpoint handlers
//!
//! - `/pubkey` - The SSH public key(s), verbatim
//! - `/livez` - Liveness: Is the process alive?
//! - `/readyz` - Readiness: Should the load balancer route traffic here?
//! - `/drain` - Take the instance out of rotation (waits for the drain window)
//! - `/undrain` - Put the instance back into rotation

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
};

use super::drain::DrainCoordinator;

/// Shared state for the API handlers
#[derive(Clone)]
pub struct ApiState {
    coordinator: DrainCoordinator,
    pubkey: Bytes,
}

impl ApiState {
    pub fn new(coordinator: DrainCoordinator, pubkey: impl Into<Bytes>) -> Self {
        Self {
            coordinator,
            pubkey: pubkey.into(),
        }
    }
}

/// Public key handler
///
/// Serves the key bytes exactly as loaded, nothing appended. The body is
/// written after this returns, so a client hanging up mid-write surfaces as a
/// connection error that the serving layer drops; nothing is retried.
pub async fn pubkey(State(state): State<ApiState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.pubkey.clone(),
    )
}

/// Liveness probe handler
///
/// Always returns 200 OK - if this responds, the process is alive.
pub async fn livez(State(state): State<ApiState>) -> StatusCode {
    if state.coordinator.liveness_check() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Readiness probe handler
///
/// Returns 200 OK if ready, 503 Service Unavailable while drained.
pub async fn readyz(State(state): State<ApiState>) -> StatusCode {
    if state.coordinator.readiness_check() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Drain handler
///
/// Responds once the drain window has elapsed, or at once if already drained.
pub async fn drain(State(state): State<ApiState>) -> StatusCode {
    state.coordinator.drain().await;
    StatusCode::OK
}

/// Undrain handler
pub async fn undrain(State(state): State<ApiState>) -> StatusCode {
    state.coordinator.undrain();
    StatusCode::OK
}

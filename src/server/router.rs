//! Request routing for the API listener
//!
//! Every API route runs inside [`track_request`], which times the whole
//! handler (including the drain wait), records the duration under the
//! matched route and logs the request.
//!
//! The key is deliberately not served at `/`: default-path scans should not
//! stumble on it.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use std::time::{Duration, Instant};
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

use super::debug::{build_debug_router, DiagnosticsState, DEBUG_PREFIX};
use super::health::{self, ApiState};
use super::metrics::SharedMetrics;

/// Paths served by the API listener
pub const PUBKEY_PATH: &str = "/pubkey";
pub const LIVEZ_PATH: &str = "/livez";
pub const READYZ_PATH: &str = "/readyz";
pub const DRAIN_PATH: &str = "/drain";
pub const UNDRAIN_PATH: &str = "/undrain";

/// Logging and timing middleware applied to every API route
pub async fn track_request(
    State(metrics): State<SharedMetrics>,
    request: Request,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed();

    metrics.observe_request(&route, elapsed);

    let status = response.status();
    if status.is_server_error() && route != READYZ_PATH {
        warn!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_us = elapsed.as_micros() as u64,
            "Request failed"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_us = elapsed.as_micros() as u64,
            "Request handled"
        );
    }

    response
}

/// Build the API router
///
/// `diagnostics` mounts the `/debug` sub-tree; `None` leaves it unrouted.
/// `request_timeout` bounds every route except `/drain`, whose response must
/// wait out the full drain window however long it is configured.
pub fn build_api_router(
    state: ApiState,
    metrics: SharedMetrics,
    diagnostics: Option<DiagnosticsState>,
    request_timeout: Option<Duration>,
) -> Router {
    let mut router = Router::new()
        .route(PUBKEY_PATH, get(health::pubkey))
        .route(LIVEZ_PATH, get(health::livez))
        .route(READYZ_PATH, get(health::readyz))
        .route(UNDRAIN_PATH, get(health::undrain))
        .with_state(state.clone());

    if let Some(diagnostics) = diagnostics {
        info!("Diagnostics API enabled");
        router = router.nest(DEBUG_PREFIX, build_debug_router(diagnostics));
    }

    if let Some(timeout) = request_timeout {
        #[allow(deprecated)]
        let layer = TimeoutLayer::new(timeout);
        router = router.route_layer(layer);
    }

    let drain = Router::new()
        .route(DRAIN_PATH, get(health::drain))
        .with_state(state);

    // route_layer so unmatched paths (404s) are neither timed nor logged
    router
        .merge(drain)
        .route_layer(middleware::from_fn_with_state(metrics, track_request))
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;

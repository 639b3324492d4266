//! Prometheus metrics for the pubkey server
//!
//! Metrics:
//! - `ssh_pubkey_server_request_duration_api` - request handling duration in
//!   microseconds, labelled by route
//!
//! The registry is owned by the service rather than the process-global default
//! so several services can coexist (tests construct many).

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use prometheus::{Encoder, HistogramOpts, HistogramVec, Registry, TextEncoder};
use std::sync::Arc;
use std::time::Duration;

/// Metric namespace (prefix)
pub const METRICS_NAMESPACE: &str = "ssh_pubkey_server";

/// Request duration buckets, in microseconds
pub const REQUEST_DURATION_BUCKETS_US: &[f64] = &[
    5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1_000.0, 2_500.0, 5_000.0, 10_000.0, 25_000.0,
    50_000.0, 100_000.0, 250_000.0, 500_000.0, 1_000_000.0,
];

/// Metrics sink shared by the API router and the metrics listener
#[derive(Clone)]
pub struct ServerMetrics {
    registry: Registry,
    request_duration: HistogramVec,
}

/// Shared handle to the metrics sink
pub type SharedMetrics = Arc<ServerMetrics>;

impl ServerMetrics {
    /// Create a registry with all server metrics registered
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "request_duration_api",
                "API request handling duration in microseconds",
            )
            .namespace(METRICS_NAMESPACE)
            .buckets(REQUEST_DURATION_BUCKETS_US.to_vec()),
            &["route"],
        )?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self {
            registry,
            request_duration,
        })
    }

    /// Record one handled request for `route`
    pub fn observe_request(&self, route: &str, elapsed: Duration) {
        self.request_duration
            .with_label_values(&[route])
            .observe(elapsed.as_micros() as f64);
    }

    /// Number of observations recorded for `route`
    pub fn request_count(&self, route: &str) -> u64 {
        self.request_duration
            .with_label_values(&[route])
            .get_sample_count()
    }

    /// Render all metrics in the Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Create the shared metrics sink
pub fn create_metrics() -> Result<SharedMetrics, prometheus::Error> {
    Ok(Arc::new(ServerMetrics::new()?))
}

/// Prometheus scrape handler
async fn metrics(State(metrics): State<SharedMetrics>) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {}", e),
        )
            .into_response(),
    }
}

/// Build the router served by the metrics listener
pub fn build_metrics_router(metrics: SharedMetrics) -> Router {
    Router::new()
        .route("/metrics", get(self::metrics))
        .with_state(metrics)
}

#[cfg(test)]
#[path = "metrics_test.rs"]
mod tests;

//! Tests for API routing and the request middleware

use super::*;
use crate::config::ServerConfig;
use crate::server::drain::DrainCoordinator;
use crate::server::metrics::create_metrics;
use crate::server::readiness::ReadinessState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

const TEST_KEY: &[u8] = b"ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIFGGVd5nQewq0hETk2Tr/P7OZxTW/4aftdfh9/cAe7FC";

struct TestApi {
    addr: SocketAddr,
    metrics: SharedMetrics,
    readiness: ReadinessState,
    server: tokio::task::JoinHandle<()>,
}

impl TestApi {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Serve the API router on an ephemeral port
async fn spawn_api(diagnostics: bool) -> TestApi {
    spawn_api_with_timeout(diagnostics, None).await
}

async fn spawn_api_with_timeout(diagnostics: bool, request_timeout: Option<Duration>) -> TestApi {
    let readiness = ReadinessState::new();
    let metrics = create_metrics().expect("metrics registry");
    let coordinator = DrainCoordinator::new(readiness.clone(), Duration::from_millis(100));
    let state = ApiState::new(coordinator, TEST_KEY.to_vec());

    let diagnostics = diagnostics.then(|| {
        DiagnosticsState::new(Arc::new(ServerConfig::default()), readiness.clone())
    });
    let router = build_api_router(state, metrics.clone(), diagnostics, request_timeout);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    TestApi {
        addr,
        metrics,
        readiness,
        server,
    }
}

#[tokio::test]
async fn test_pubkey_route_returns_key_bytes() {
    let api = spawn_api(false).await;

    let response = reqwest::get(api.url(PUBKEY_PATH)).await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.bytes().await.unwrap().as_ref(), TEST_KEY);
}

/// The key must never be reachable at the root path
#[tokio::test]
async fn test_root_path_is_not_routed() {
    let api = spawn_api(false).await;

    let response = reqwest::get(api.url("/")).await.unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_routes_are_get_only() {
    let api = spawn_api(false).await;

    let response = reqwest::Client::new()
        .post(api.url(DRAIN_PATH))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 405);
    assert!(api.readiness.is_ready(), "POST must not drain");
}

#[tokio::test]
async fn test_health_check_routes() {
    let api = spawn_api(false).await;

    assert_eq!(reqwest::get(api.url(LIVEZ_PATH)).await.unwrap().status(), 200);
    assert_eq!(reqwest::get(api.url(READYZ_PATH)).await.unwrap().status(), 200);

    api.readiness.set_ready(false);

    assert_eq!(reqwest::get(api.url(LIVEZ_PATH)).await.unwrap().status(), 200);
    assert_eq!(reqwest::get(api.url(READYZ_PATH)).await.unwrap().status(), 503);
}

#[tokio::test]
async fn test_middleware_records_duration_per_route() {
    let api = spawn_api(false).await;

    reqwest::get(api.url(PUBKEY_PATH)).await.unwrap();
    reqwest::get(api.url(PUBKEY_PATH)).await.unwrap();
    reqwest::get(api.url(LIVEZ_PATH)).await.unwrap();
    reqwest::get(api.url("/nope")).await.unwrap();

    assert_eq!(api.metrics.request_count(PUBKEY_PATH), 2);
    assert_eq!(api.metrics.request_count(LIVEZ_PATH), 1);
    assert_eq!(api.metrics.request_count("/nope"), 0);
}

/// The recorded duration covers the drain wait
#[tokio::test]
async fn test_middleware_times_whole_drain() {
    let api = spawn_api(false).await;

    reqwest::get(api.url(DRAIN_PATH)).await.unwrap();

    let output = api.metrics.encode().unwrap();
    let sum_line = output
        .lines()
        .find(|line| {
            line.starts_with("ssh_pubkey_server_request_duration_api_sum")
                && line.contains("route=\"/drain\"")
        })
        .expect("drain duration should be recorded");
    let micros: f64 = sum_line
        .rsplit(' ')
        .next()
        .and_then(|v| v.parse().ok())
        .expect("sample value");
    assert!(micros >= 100_000.0, "recorded {}us", micros);
}

#[tokio::test]
async fn test_debug_routes_absent_when_disabled() {
    let api = spawn_api(false).await;

    let response = reqwest::get(api.url("/debug/vars")).await.unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_debug_vars_when_enabled() {
    let api = spawn_api(true).await;
    api.readiness.set_ready(false);

    let response = reqwest::get(api.url("/debug/vars")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["service"], crate::SERVICE_NAME);
    assert_eq!(body["ready"], false);
    assert_eq!(body["config"]["enable_diagnostics"], false);
    assert!(body["uptime_seconds"].as_i64().unwrap() >= 0);
    assert_eq!(api.metrics.request_count("/debug/vars"), 1);
}

/// A request timeout shorter than the drain window must not cut `/drain` short
#[tokio::test]
async fn test_drain_is_not_bound_by_request_timeout() {
    let api = spawn_api_with_timeout(false, Some(Duration::from_millis(20))).await;

    let start = std::time::Instant::now();
    let response = reqwest::get(api.url(DRAIN_PATH)).await.unwrap();

    assert_eq!(response.status(), 200);
    assert!(start.elapsed() >= Duration::from_millis(100));
    assert!(!api.readiness.is_ready());
}

#[tokio::test]
async fn test_request_timeout_still_applies_to_other_routes() {
    let api = spawn_api_with_timeout(true, Some(Duration::from_millis(500))).await;

    for path in [PUBKEY_PATH, LIVEZ_PATH, READYZ_PATH, UNDRAIN_PATH, "/debug/vars"] {
        let response = reqwest::get(api.url(path)).await.unwrap();
        assert_eq!(response.status(), 200, "{}", path);
    }
    assert_eq!(reqwest::get(api.url("/nope")).await.unwrap().status(), 404);
}

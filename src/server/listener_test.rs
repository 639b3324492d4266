//! Tests for the listener lifecycle

use super::*;
use axum::routing::get;
use std::time::Instant;

fn loopback() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 0))
}

fn slow_router(delay: Duration) -> Router {
    Router::new()
        .route("/fast", get(|| async { "ok" }))
        .route(
            "/slow",
            get(move || async move {
                tokio::time::sleep(delay).await;
                "done"
            }),
        )
}

async fn started(router: Router, request_timeout: Option<Duration>) -> (Listener, SocketAddr) {
    let mut listener = Listener::new(ListenerKind::Api, loopback(), request_timeout);
    listener.start(router).expect("listener should start");
    let addr = listener
        .local_addr()
        .await
        .expect("listener should be bound");
    (listener, addr)
}

#[test]
fn test_listener_kind_display() {
    assert_eq!(ListenerKind::Api.to_string(), "api");
    assert_eq!(ListenerKind::Metrics.to_string(), "metrics");
}

#[tokio::test]
async fn test_listener_serves_after_start() {
    let (mut listener, addr) = started(slow_router(Duration::ZERO), None).await;
    assert_eq!(listener.state(), ListenerState::Running);

    let body = reqwest::get(format!("http://{}/fast", addr))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "ok");

    listener.shutdown(Duration::from_secs(1)).await.unwrap();
    assert_eq!(listener.state(), ListenerState::Stopped);
}

#[tokio::test]
async fn test_idle_listener_has_no_address() {
    let listener = Listener::new(ListenerKind::Metrics, loopback(), None);

    assert_eq!(listener.state(), ListenerState::Idle);
    assert_eq!(listener.local_addr().await, None);
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let (mut listener, _) = started(slow_router(Duration::ZERO), None).await;

    assert_eq!(
        listener.start(slow_router(Duration::ZERO)),
        Err(ListenerError::AlreadyRunning(ListenerKind::Api))
    );

    listener.shutdown(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
async fn test_stopped_listener_cannot_restart() {
    let (mut listener, _) = started(slow_router(Duration::ZERO), None).await;
    listener.shutdown(Duration::from_secs(1)).await.unwrap();

    assert_eq!(
        listener.start(slow_router(Duration::ZERO)),
        Err(ListenerError::AlreadyStopped(ListenerKind::Api))
    );
}

#[tokio::test]
async fn test_shutdown_idle_listener_is_noop() {
    let mut listener = Listener::new(ListenerKind::Metrics, loopback(), None);

    listener.shutdown(Duration::from_millis(10)).await.unwrap();

    assert_eq!(listener.state(), ListenerState::Stopped);
}

#[tokio::test]
async fn test_shutdown_twice_is_noop() {
    let (mut listener, _) = started(slow_router(Duration::ZERO), None).await;

    listener.shutdown(Duration::from_secs(1)).await.unwrap();
    listener.shutdown(Duration::from_secs(1)).await.unwrap();
}

/// A bind failure is logged inside the task, not surfaced as a panic
#[tokio::test]
async fn test_bind_failure_is_contained() {
    let occupied = std::net::TcpListener::bind(loopback()).unwrap();
    let addr = occupied.local_addr().unwrap();

    let mut listener = Listener::new(ListenerKind::Api, addr, None);
    listener.start(slow_router(Duration::ZERO)).unwrap();

    assert_eq!(listener.local_addr().await, None);
    listener.shutdown(Duration::from_secs(1)).await.unwrap();
}

/// In-flight requests finish when they fit inside the deadline
#[tokio::test]
async fn test_graceful_shutdown_lets_inflight_finish() {
    let (mut listener, addr) = started(slow_router(Duration::from_millis(200)), None).await;

    let request = tokio::spawn(async move { reqwest::get(format!("http://{}/slow", addr)).await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    listener.shutdown(Duration::from_secs(5)).await.unwrap();

    let response = request.await.unwrap().expect("in-flight request should complete");
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "done");
}

#[tokio::test]
async fn test_new_connections_refused_after_shutdown() {
    let (mut listener, addr) = started(slow_router(Duration::ZERO), None).await;

    listener.shutdown(Duration::from_secs(1)).await.unwrap();

    let result = reqwest::Client::new()
        .get(format!("http://{}/fast", addr))
        .timeout(Duration::from_millis(500))
        .send()
        .await;
    assert!(result.is_err(), "Stopped listener must not accept");
}

/// Exceeding the deadline force-closes and reports, within a bounded time
#[tokio::test]
async fn test_shutdown_deadline_exceeded() {
    let (mut listener, addr) = started(slow_router(Duration::from_secs(30)), None).await;

    let request = tokio::spawn(async move { reqwest::get(format!("http://{}/slow", addr)).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let deadline = Duration::from_millis(200);
    let start = Instant::now();
    let result = listener.shutdown(deadline).await;
    let elapsed = start.elapsed();

    match result {
        Err(ShutdownError::DeadlineExceeded {
            listener: kind,
            deadline: reported,
            ..
        }) => {
            assert_eq!(kind, ListenerKind::Api);
            assert_eq!(reported, deadline);
        }
        other => panic!("expected DeadlineExceeded, got {:?}", other),
    }
    assert!(elapsed >= deadline);
    assert!(
        elapsed < deadline + FORCE_CLOSE_GRACE + Duration::from_millis(500),
        "shutdown took {:?}",
        elapsed
    );
    assert_eq!(listener.state(), ListenerState::Stopped);

    let response = request.await.unwrap();
    assert!(response.is_err(), "Force-closed request must not succeed");
}

#[tokio::test]
async fn test_request_timeout_returns_408() {
    let (mut listener, addr) = started(
        slow_router(Duration::from_secs(5)),
        Some(Duration::from_millis(100)),
    )
    .await;

    let response = reqwest::get(format!("http://{}/slow", addr)).await.unwrap();
    assert_eq!(response.status(), 408);

    let response = reqwest::get(format!("http://{}/fast", addr)).await.unwrap();
    assert_eq!(response.status(), 200);

    listener.shutdown(Duration::from_secs(1)).await.unwrap();
}

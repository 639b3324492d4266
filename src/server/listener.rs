//! A single HTTP listener with an explicit lifecycle
//!
//! ```text
//! Idle --start--> Running --shutdown--> Stopped
//! ```
//!
//! Binding happens inside the serving task: a bind or serve failure is
//! logged there and never takes down the process or the other listener.
//! Once stopped a listener is never restarted.

use axum::Router;
use axum_server::Handle;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info, warn};

/// Time allowed for the serving task to unwind after a forced close
pub const FORCE_CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Which surface a listener serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    Api,
    Metrics,
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerKind::Api => write!(f, "api"),
            ListenerKind::Metrics => write!(f, "metrics"),
        }
    }
}

/// Lifecycle state of a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Idle,
    Running,
    Stopped,
}

/// Errors from misusing the listener lifecycle
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ListenerError {
    #[error("{0} listener is already running")]
    AlreadyRunning(ListenerKind),

    #[error("{0} listener was stopped and cannot be restarted")]
    AlreadyStopped(ListenerKind),
}

/// Errors from stopping a listener
#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error(
        "{listener} listener did not drain within {deadline:?} ({connections} connections force-closed)"
    )]
    DeadlineExceeded {
        listener: ListenerKind,
        deadline: Duration,
        connections: usize,
    },

    #[error("{listener} listener task failed: {source}")]
    Task {
        listener: ListenerKind,
        #[source]
        source: tokio::task::JoinError,
    },
}

/// An HTTP listener bound to one address
pub struct Listener {
    kind: ListenerKind,
    addr: SocketAddr,
    request_timeout: Option<Duration>,
    handle: Handle,
    task: Option<JoinHandle<()>>,
    state: ListenerState,
}

impl Listener {
    /// Create an idle listener; nothing is bound until [`Listener::start`]
    pub fn new(kind: ListenerKind, addr: SocketAddr, request_timeout: Option<Duration>) -> Self {
        Self {
            kind,
            addr,
            request_timeout,
            handle: Handle::new(),
            task: None,
            state: ListenerState::Idle,
        }
    }

    pub fn kind(&self) -> ListenerKind {
        self.kind
    }

    /// Configured bind address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    /// Bind and serve `router` on a background task
    pub fn start(&mut self, router: Router) -> Result<(), ListenerError> {
        match self.state {
            ListenerState::Running => return Err(ListenerError::AlreadyRunning(self.kind)),
            ListenerState::Stopped => return Err(ListenerError::AlreadyStopped(self.kind)),
            ListenerState::Idle => {}
        }

        #[allow(deprecated)]
        let app = match self.request_timeout {
            Some(timeout) => router.layer(TimeoutLayer::new(timeout)),
            None => router,
        };

        let kind = self.kind;
        let addr = self.addr;
        let handle = self.handle.clone();

        self.task = Some(tokio::spawn(async move {
            info!(listener = %kind, address = %addr, "Starting HTTP server");

            // axum-server returns Ok(()) after a deliberate shutdown, so any
            // error here is a real bind/accept failure.
            if let Err(e) = axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
            {
                error!(listener = %kind, address = %addr, error = %e, "HTTP server failed");
            }
        }));
        self.state = ListenerState::Running;

        Ok(())
    }

    /// Address actually bound, once listening
    ///
    /// `None` if the listener never started or failed to bind.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        if self.state == ListenerState::Idle {
            return None;
        }
        self.handle.listening().await
    }

    /// Stop accepting, wait up to `deadline` for in-flight requests, then force close
    ///
    /// Stopping an idle or already stopped listener is a no-op.
    pub async fn shutdown(&mut self, deadline: Duration) -> Result<(), ShutdownError> {
        self.state = ListenerState::Stopped;
        let Some(mut task) = self.task.take() else {
            return Ok(());
        };

        info!(listener = %self.kind, deadline = ?deadline, "Stopping HTTP server");

        // The deadline is enforced here rather than by axum-server so the
        // outcome is observable.
        self.handle.graceful_shutdown(None);

        match tokio::time::timeout(deadline, &mut task).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(ShutdownError::Task {
                listener: self.kind,
                source,
            }),
            Err(_) => {
                let connections = self.handle.connection_count();
                warn!(
                    listener = %self.kind,
                    connections,
                    "Graceful shutdown deadline exceeded, closing connections"
                );
                self.handle.shutdown();

                if tokio::time::timeout(FORCE_CLOSE_GRACE, &mut task)
                    .await
                    .is_err()
                {
                    task.abort();
                }

                Err(ShutdownError::DeadlineExceeded {
                    listener: self.kind,
                    deadline,
                    connections,
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "listener_test.rs"]
mod tests;

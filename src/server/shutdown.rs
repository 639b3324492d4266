//! Graceful shutdown handling for the pubkey server
//!
//! On SIGTERM/SIGINT the listeners are stopped in order:
//! - API listener first, so customer-facing traffic stops before the
//!   diagnostics surface goes away
//! - Metrics listener second (skipped when disabled)
//!
//! Each listener gets its own deadline. A listener that misses its deadline
//! is force-closed and logged; the sequence always runs to the end.

use std::time::Duration;
use tracing::{error, info};

use super::listener::{Listener, ShutdownError};

/// Per-listener outcome of a shutdown sequence
#[derive(Debug)]
pub struct ShutdownReport {
    pub api: Result<(), ShutdownError>,
    /// `None` when the metrics listener is disabled
    pub metrics: Option<Result<(), ShutdownError>>,
}

impl ShutdownReport {
    /// True when every listener drained within its deadline
    pub fn is_clean(&self) -> bool {
        self.api.is_ok() && !matches!(self.metrics, Some(Err(_)))
    }
}

/// Stops the listener pair, each within its own deadline
#[derive(Debug, Clone, Copy)]
pub struct ShutdownSequencer {
    deadline: Duration,
}

impl ShutdownSequencer {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    /// Stop the API listener, then the metrics listener
    ///
    /// Never fails as a whole; per-listener failures are logged and reported.
    pub async fn run(&self, api: &mut Listener, metrics: Option<&mut Listener>) -> ShutdownReport {
        let api = self.stop(api).await;

        let metrics = match metrics {
            Some(listener) => Some(self.stop(listener).await),
            None => None,
        };

        ShutdownReport { api, metrics }
    }

    async fn stop(&self, listener: &mut Listener) -> Result<(), ShutdownError> {
        let kind = listener.kind();
        let result = listener.shutdown(self.deadline).await;

        match &result {
            Ok(()) => info!(listener = %kind, "HTTP server gracefully stopped"),
            Err(e) => error!(listener = %kind, error = %e, "Graceful HTTP server shutdown failed"),
        }

        result
    }
}

/// Wait for SIGTERM or SIGINT signal
///
/// Returns the signal name that was received, or an error if the signal
/// handlers cannot be registered.
#[cfg(unix)]
pub async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    info!(signal = name, "Received termination signal");
    Ok(name)
}

/// Wait for Ctrl+C signal (Windows)
#[cfg(not(unix))]
pub async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C");
    Ok("CTRL_C")
}

#[cfg(test)]
#[path = "shutdown_test.rs"]
mod tests;

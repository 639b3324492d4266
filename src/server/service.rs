//! Top-level service: one readiness flag, one API listener, an optional
//! metrics listener
//!
//! Construction is the only fallible step (config, keys, metrics registry);
//! once built, serving and shutdown failures are logged and absorbed.

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use super::debug::DiagnosticsState;
use super::drain::DrainCoordinator;
use super::health::ApiState;
use super::listener::{Listener, ListenerKind};
use super::metrics::{build_metrics_router, create_metrics, SharedMetrics};
use super::readiness::ReadinessState;
use super::router::build_api_router;
use super::shutdown::{ShutdownReport, ShutdownSequencer};
use crate::config::{ConfigError, ServerConfig};
use crate::pubkey::{load_pubkeys, PubkeyError};

/// Errors that prevent the service from being constructed
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pubkey(#[from] PubkeyError),

    #[error("failed to create metrics registry: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// The SSH public key server
pub struct PubkeyServer {
    config: Arc<ServerConfig>,
    readiness: ReadinessState,
    metrics: SharedMetrics,
    api_router: Option<axum::Router>,
    api: Listener,
    metrics_listener: Option<Listener>,
}

impl PubkeyServer {
    /// Validate the config, load the key material and build both routers
    ///
    /// The instance starts ready. Nothing is bound until
    /// [`PubkeyServer::run_in_background`].
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;

        let pubkey = load_pubkeys(&config.pubkey_paths)?;
        info!(
            sources = config.pubkey_paths.len(),
            bytes = pubkey.len(),
            "SSH public keys loaded"
        );

        let metrics = create_metrics()?;
        let config = Arc::new(config);
        let readiness = ReadinessState::new();

        let coordinator = DrainCoordinator::new(readiness.clone(), config.drain_duration);
        let diagnostics = config
            .enable_diagnostics
            .then(|| DiagnosticsState::new(config.clone(), readiness.clone()));
        let request_timeout = config.request_timeout();
        let api_router = build_api_router(
            ApiState::new(coordinator, pubkey),
            metrics.clone(),
            diagnostics,
            request_timeout,
        );

        // The API router carries its own per-route timeout (see build_api_router)
        let api = Listener::new(ListenerKind::Api, config.listen_addr, None);
        let metrics_listener = config
            .metrics_addr
            .map(|addr| Listener::new(ListenerKind::Metrics, addr, request_timeout));

        Ok(Self {
            config,
            readiness,
            metrics,
            api_router: Some(api_router),
            api,
            metrics_listener,
        })
    }

    /// Start both listeners; each binds and serves independently
    ///
    /// Calling this more than once has no further effect.
    pub fn run_in_background(&mut self) {
        if let Some(listener) = self.metrics_listener.as_mut() {
            if let Err(e) = listener.start(build_metrics_router(self.metrics.clone())) {
                error!(error = %e, "Failed to start metrics server");
            }
        }

        if let Some(router) = self.api_router.take() {
            if let Err(e) = self.api.start(router) {
                error!(error = %e, "Failed to start HTTP server");
            }
        }
    }

    /// Stop the API listener, then the metrics listener
    pub async fn shutdown(&mut self) -> ShutdownReport {
        ShutdownSequencer::new(self.config.graceful_shutdown_duration)
            .run(&mut self.api, self.metrics_listener.as_mut())
            .await
    }

    /// Bound API address, `None` until listening or if binding failed
    pub async fn api_addr(&self) -> Option<SocketAddr> {
        self.api.local_addr().await
    }

    /// Bound metrics address, `None` when disabled or not listening
    pub async fn metrics_addr(&self) -> Option<SocketAddr> {
        match &self.metrics_listener {
            Some(listener) => listener.local_addr().await,
            None => None,
        }
    }

    /// Handle to the readiness flag shared with the handlers
    pub fn readiness(&self) -> ReadinessState {
        self.readiness.clone()
    }

    pub fn metrics(&self) -> SharedMetrics {
        self.metrics.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;

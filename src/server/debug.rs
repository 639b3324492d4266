//! Diagnostics sub-tree, mounted under `/debug` when enabled
//!
//! - `/debug/vars` - JSON snapshot of build info, uptime, readiness and the
//!   effective configuration

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use super::readiness::ReadinessState;
use crate::config::ServerConfig;
use crate::{SERVICE_NAME, SERVICE_VERSION};

/// Path prefix of the diagnostics sub-tree
pub const DEBUG_PREFIX: &str = "/debug";

#[derive(Clone)]
pub struct DiagnosticsState {
    config: Arc<ServerConfig>,
    readiness: ReadinessState,
    started_at: DateTime<Utc>,
}

impl DiagnosticsState {
    pub fn new(config: Arc<ServerConfig>, readiness: ReadinessState) -> Self {
        Self {
            config,
            readiness,
            started_at: Utc::now(),
        }
    }
}

/// Body of `/debug/vars`
#[derive(Debug, Serialize)]
pub struct DebugVars {
    pub service: &'static str,
    pub version: &'static str,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: i64,
    pub ready: bool,
    pub config: ServerConfig,
}

async fn vars(State(state): State<DiagnosticsState>) -> Json<DebugVars> {
    Json(DebugVars {
        service: SERVICE_NAME,
        version: SERVICE_VERSION,
        started_at: state.started_at,
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
        ready: state.readiness.is_ready(),
        config: state.config.as_ref().clone(),
    })
}

/// Build the router nested at [`DEBUG_PREFIX`]
pub fn build_debug_router(state: DiagnosticsState) -> Router {
    Router::new().route("/vars", get(vars)).with_state(state)
}

//! SSH public key server
//!
//! Serves a host's SSH public key over HTTP behind a load balancer and takes
//! part in the load balancer's health-check and rolling-deployment protocol:
//! liveness/readiness probes plus `/drain` and `/undrain` for moving the
//! instance out of (and back into) rotation.

pub mod cli;
pub mod config;
pub mod logging;
pub mod pubkey;
pub mod server;

/// Service name used in logs and diagnostics
pub const SERVICE_NAME: &str = env!("CARGO_PKG_NAME");

/// Service version used in logs and diagnostics
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

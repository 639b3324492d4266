//! Command line interface
//!
//! Every flag can also be set through an `SSH_PUBKEY_SERVER_*` environment
//! variable. Durations use humantime syntax (`45s`, `500ms`, `1m30s`).

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{
    ServerConfig, DEFAULT_LISTEN_ADDR, DEFAULT_METRICS_ADDR, DEFAULT_PUBKEY_PATH,
};
use crate::logging::LogConfig;

#[derive(Debug, Parser)]
#[command(name = "ssh-pubkey-server", version, about = "Serve SSH public keys over HTTP")]
pub struct Cli {
    /// API listen address
    #[arg(long, env = "SSH_PUBKEY_SERVER_LISTEN_ADDR", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Metrics listen address; empty disables the metrics listener
    #[arg(
        long,
        env = "SSH_PUBKEY_SERVER_METRICS_ADDR",
        default_value = DEFAULT_METRICS_ADDR,
        value_parser = parse_optional_addr
    )]
    pub metrics_addr: std::option::Option<SocketAddr>,

    /// Mount the /debug diagnostics routes
    #[arg(long, env = "SSH_PUBKEY_SERVER_ENABLE_DIAGNOSTICS")]
    pub enable_diagnostics: bool,

    /// How long /drain waits before responding
    #[arg(
        long,
        env = "SSH_PUBKEY_SERVER_DRAIN_DURATION",
        default_value = "45s",
        value_parser = humantime::parse_duration
    )]
    pub drain_duration: Duration,

    /// Per-listener graceful shutdown deadline
    #[arg(
        long,
        env = "SSH_PUBKEY_SERVER_GRACEFUL_SHUTDOWN_DURATION",
        default_value = "30s",
        value_parser = humantime::parse_duration
    )]
    pub graceful_shutdown_duration: Duration,

    /// Read timeout (0s = unbounded)
    #[arg(
        long,
        env = "SSH_PUBKEY_SERVER_READ_TIMEOUT",
        default_value = "60s",
        value_parser = humantime::parse_duration
    )]
    pub read_timeout: Duration,

    /// Write timeout (0s = unbounded)
    #[arg(
        long,
        env = "SSH_PUBKEY_SERVER_WRITE_TIMEOUT",
        default_value = "30s",
        value_parser = humantime::parse_duration
    )]
    pub write_timeout: Duration,

    /// SSH public key file(s) to serve, in order
    #[arg(
        long = "pubkey-path",
        env = "SSH_PUBKEY_SERVER_PUBKEY_PATH",
        value_delimiter = ',',
        default_value = DEFAULT_PUBKEY_PATH
    )]
    pub pubkey_paths: Vec<PathBuf>,

    /// Log in JSON format
    #[arg(long, env = "SSH_PUBKEY_SERVER_LOG_JSON")]
    pub log_json: bool,

    /// Log debug messages
    #[arg(long, env = "SSH_PUBKEY_SERVER_LOG_DEBUG")]
    pub log_debug: bool,
}

/// Empty string means "disabled"
fn parse_optional_addr(value: &str) -> Result<Option<SocketAddr>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|e| format!("invalid socket address '{}': {}", value, e))
}

impl Cli {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            listen_addr: self.listen_addr,
            metrics_addr: self.metrics_addr,
            enable_diagnostics: self.enable_diagnostics,
            drain_duration: self.drain_duration,
            graceful_shutdown_duration: self.graceful_shutdown_duration,
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
            pubkey_paths: self.pubkey_paths.clone(),
        }
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            json: self.log_json,
            debug: self.log_debug,
        }
    }
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

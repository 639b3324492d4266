//! Runtime configuration for the pubkey server
//!
//! `ServerConfig` is built once at startup (usually from the CLI, see
//! [`crate::cli`]) and never mutated afterwards. The service keeps it
//! behind an `Arc` so handlers can read it without copying.

use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default API listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Default metrics listen address
pub const DEFAULT_METRICS_ADDR: &str = "127.0.0.1:8090";

/// Default key location (host ed25519 key)
pub const DEFAULT_PUBKEY_PATH: &str = "/etc/ssh/ssh_host_ed25519_key.pub";

/// How long `/drain` holds the caller so LB health polling sees "not ready"
pub const DEFAULT_DRAIN_DURATION: Duration = Duration::from_secs(45);

/// Per-listener graceful shutdown deadline
pub const DEFAULT_GRACEFUL_SHUTDOWN_DURATION: Duration = Duration::from_secs(30);

/// Default read timeout
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Default write timeout
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors found while validating a configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least one SSH public key path must be configured")]
    NoPubkeyPaths,

    #[error("metrics address {0} collides with the API listen address")]
    AddressCollision(SocketAddr),

    #[error("graceful shutdown duration must be greater than zero")]
    ZeroShutdownDuration,
}

/// Immutable runtime parameters for the service
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    /// API listener address (pubkey, probes, drain)
    pub listen_addr: SocketAddr,

    /// Metrics listener address; `None` disables the metrics listener
    pub metrics_addr: Option<SocketAddr>,

    /// Mount the `/debug` diagnostics sub-tree on the API listener
    pub enable_diagnostics: bool,

    #[serde(with = "duration_text")]
    pub drain_duration: Duration,

    #[serde(with = "duration_text")]
    pub graceful_shutdown_duration: Duration,

    /// Zero means unbounded
    #[serde(with = "duration_text")]
    pub read_timeout: Duration,

    /// Zero means unbounded
    #[serde(with = "duration_text")]
    pub write_timeout: Duration,

    /// Key files, served in this order
    pub pubkey_paths: Vec<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            metrics_addr: Some(SocketAddr::from(([127, 0, 0, 1], 8090))),
            enable_diagnostics: false,
            drain_duration: DEFAULT_DRAIN_DURATION,
            graceful_shutdown_duration: DEFAULT_GRACEFUL_SHUTDOWN_DURATION,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            pubkey_paths: vec![PathBuf::from(DEFAULT_PUBKEY_PATH)],
        }
    }
}

impl ServerConfig {
    /// Check the semantic constraints serde/clap cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pubkey_paths.is_empty() {
            return Err(ConfigError::NoPubkeyPaths);
        }

        if let Some(metrics_addr) = self.metrics_addr {
            // Port 0 asks the OS for a fresh port on each bind, so equal
            // addresses only collide when the port is fixed.
            if metrics_addr == self.listen_addr && metrics_addr.port() != 0 {
                return Err(ConfigError::AddressCollision(metrics_addr));
            }
        }

        if self.graceful_shutdown_duration.is_zero() {
            return Err(ConfigError::ZeroShutdownDuration);
        }

        Ok(())
    }

    /// Request handling bound for a listener, `None` when unbounded
    pub fn request_timeout(&self) -> Option<Duration> {
        let total = self.read_timeout + self.write_timeout;
        if total.is_zero() {
            None
        } else {
            Some(total)
        }
    }
}

/// Serialize durations as humantime strings ("45s") in diagnostics output
mod duration_text {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*duration))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

//! HTTP serving for the pubkey server
//!
//! Two listeners:
//! - API: `/pubkey`, `/livez`, `/readyz`, `/drain`, `/undrain`, and
//!   optionally `/debug/*`
//! - Metrics: `/metrics` (Prometheus text format), optional
//!
//! Also provides the readiness/drain lifecycle and graceful shutdown
//! handling for SIGTERM/SIGINT.

pub mod debug;
pub mod drain;
pub mod health;
pub mod listener;
pub mod metrics;
pub mod readiness;
pub mod router;
mod service;
pub mod shutdown;

pub use drain::{DrainCoordinator, Transition};
pub use listener::{Listener, ListenerError, ListenerKind, ListenerState, ShutdownError};
pub use metrics::{create_metrics, ServerMetrics, SharedMetrics};
pub use readiness::ReadinessState;
pub use service::{PubkeyServer, ServerError};
pub use shutdown::{wait_for_signal, ShutdownReport, ShutdownSequencer};

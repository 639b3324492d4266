//! Readiness flag shared by every request handler
//!
//! The only shared mutable state in the server. Reads sit on the hot path of
//! every `/readyz` probe, so this is a plain atomic rather than a lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared state for readiness tracking
///
/// Cloning is cheap and every clone observes the same flag.
#[derive(Debug, Clone)]
pub struct ReadinessState {
    ready: Arc<AtomicBool>,
}

impl ReadinessState {
    /// Create a new readiness state (initially ready)
    pub fn new() -> Self {
        Self::with_initial(true)
    }

    /// Create a readiness state with an explicit starting value
    pub fn with_initial(ready: bool) -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(ready)),
        }
    }

    /// Swap in a new value and return the one it replaced
    ///
    /// Callers compare the returned value to detect redundant transitions;
    /// a separate load-then-store would race with concurrent callers.
    pub fn set_ready(&self, ready: bool) -> bool {
        self.ready.swap(ready, Ordering::SeqCst)
    }

    /// Check if the instance should receive traffic
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

impl Default for ReadinessState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "readiness_test.rs"]
mod tests;

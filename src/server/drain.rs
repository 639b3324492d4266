//! Drain coordinator
//!
//! Moves the instance out of rotation (`drain`) and back in (`undrain`).
//!
//! Draining flips readiness to false and then holds the caller for the drain
//! duration, so load balancer health polling observes "not ready" and stops
//! routing new traffic before an orchestrator goes on to terminate the
//! instance. Only the call that performs the ready -> not ready edge waits;
//! redundant calls return immediately. Undraining never waits.

use std::time::Duration;
use tracing::{debug, info};

use super::readiness::ReadinessState;

/// Result of a drain or undrain call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// This call changed the readiness flag
    Applied,
    /// The flag already had the requested value
    Redundant,
}

/// Coordinates readiness transitions around the drain window
#[derive(Debug, Clone)]
pub struct DrainCoordinator {
    readiness: ReadinessState,
    drain_duration: Duration,
}

impl DrainCoordinator {
    pub fn new(readiness: ReadinessState, drain_duration: Duration) -> Self {
        Self {
            readiness,
            drain_duration,
        }
    }

    /// Take the instance out of rotation
    ///
    /// The wait runs on its own task: if the calling request is dropped
    /// (client disconnect, request timeout) the window still elapses in full.
    pub async fn drain(&self) -> Transition {
        let was_ready = self.readiness.set_ready(false);
        if !was_ready {
            debug!("Drain requested while already draining");
            return Transition::Redundant;
        }

        info!(
            drain_duration = ?self.drain_duration,
            "Server marked as not ready"
        );

        let drain_duration = self.drain_duration;
        let window = tokio::spawn(async move {
            tokio::time::sleep(drain_duration).await;
            debug!("Drain window elapsed");
        });

        if let Err(e) = window.await {
            // Only reachable on runtime shutdown; readiness is already false.
            debug!(error = %e, "Drain window task did not complete");
        }

        Transition::Applied
    }

    /// Put the instance back into rotation, without delay
    pub fn undrain(&self) -> Transition {
        let was_ready = self.readiness.set_ready(true);
        if was_ready {
            debug!("Undrain requested while already ready");
            return Transition::Redundant;
        }

        info!("Server marked as ready");
        Transition::Applied
    }

    /// True when the instance should receive traffic
    pub fn readiness_check(&self) -> bool {
        self.readiness.is_ready()
    }

    /// True whenever the process can run this code at all
    pub fn liveness_check(&self) -> bool {
        true
    }

    pub fn drain_duration(&self) -> Duration {
        self.drain_duration
    }

    pub fn readiness(&self) -> &ReadinessState {
        &self.readiness
    }
}

#[cfg(test)]
#[path = "drain_test.rs"]
mod tests;

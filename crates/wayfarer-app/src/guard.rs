//! Process-wide fault guard.
//!
//! Faults reach the guard from two directions: supervised background tasks
//! that panicked while nobody was awaiting them, and panics caught around
//! event processing and the runtime loop. The guard classifies the fault into
//! one readable line and, if a session may have been left half-updated,
//! resets it.

use wayfarer_agent::{AgentConnector, Fault};

use crate::{Controller, ControllerAction, LogLine};

/// Last line of defense for uncontained faults.
#[derive(Debug, Default)]
pub struct FaultGuard {
    faults_seen: u64,
}

impl FaultGuard {
    /// Create a guard that has seen no faults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `fault` and recover the controller if it believes it is connected.
    ///
    /// Recovery is `cleanup` followed by `try_reconnect`.
    pub fn recover<C: AgentConnector>(
        &mut self,
        controller: &mut Controller<C>,
        fault: &Fault,
    ) -> Vec<ControllerAction> {
        self.faults_seen += 1;
        tracing::error!(
            origin = %fault.origin,
            message = %fault.message,
            count = self.faults_seen,
            "uncontained fault"
        );

        let line =
            LogLine::error(format!("Unexpected fault in {}: {}", fault.origin, fault.message));
        let mut actions = vec![line.into()];

        if controller.state().is_connected() {
            actions.push(LogLine::warning("Resetting connection after fault").into());
            actions.extend(controller.cleanup());
            actions.extend(controller.try_reconnect());
        } else {
            actions.push(LogLine::info("Not connected, nothing to recover").into());
        }
        actions
    }

    /// Number of faults handled so far.
    pub fn faults_seen(&self) -> u64 {
        self.faults_seen
    }
}

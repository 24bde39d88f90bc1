//! Observable controller state snapshots.
//!
//! Invariants operate on snapshots rather than on the live controller so a
//! check sees one consistent moment.

use wayfarer_agent::{AgentConnector, ConnectionTarget};
use wayfarer_app::{ConnectionState, Controller, PendingOp, ReconnectTicket};

/// Snapshot of the controller and the agent behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSnapshot {
    /// Connection state.
    pub state: ConnectionState,
    /// Whether the controller owns a session handle.
    pub has_handle: bool,
    /// Most recently attempted target.
    pub last_target: Option<ConnectionTarget>,
    /// Operation input is blocked on.
    pub pending_op: Option<PendingOp>,
    /// Scheduled reconnect.
    pub pending_reconnect: Option<ReconnectTicket>,
    /// Auto-reconnect flag.
    pub auto_reconnect: bool,
    /// Sessions the agent side still considers open.
    pub live_sessions: usize,
}

impl ControllerSnapshot {
    /// Snapshot of a freshly constructed controller.
    pub fn initial() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            has_handle: false,
            last_target: None,
            pending_op: None,
            pending_reconnect: None,
            auto_reconnect: false,
            live_sessions: 0,
        }
    }

    /// Capture the observable state of `controller`.
    ///
    /// `live_sessions` comes from the connector, which the controller cannot
    /// see into.
    pub fn capture<C: AgentConnector>(controller: &Controller<C>, live_sessions: usize) -> Self {
        Self {
            state: controller.state(),
            has_handle: controller.has_handle(),
            last_target: controller.last_target().cloned(),
            pending_op: controller.pending_op(),
            pending_reconnect: controller.pending_reconnect(),
            auto_reconnect: controller.auto_reconnect(),
            live_sessions,
        }
    }
}

//! Controller input events.
//!
//! Events originate from two sources:
//! - Agent sessions, stamped with the session that produced them.
//! - Runtime timers (operation deadlines, scheduled reconnects).

use wayfarer_agent::{AgentEvent, SessionId};

use crate::{PendingOp, ReconnectTicket};

/// Events processed by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// Notification from an agent session.
    Agent {
        /// Session that emitted it.
        session: SessionId,
        /// The notification.
        event: AgentEvent,
    },

    /// An awaited operation ran out of time.
    Deadline(PendingOp),

    /// A scheduled reconnect is due.
    ReconnectDue(ReconnectTicket),
}

impl ControllerEvent {
    /// Short event name for logs and fault origins.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Agent { event, .. } => event.name(),
            Self::Deadline(_) => "deadline",
            Self::ReconnectDue(_) => "reconnect",
        }
    }
}

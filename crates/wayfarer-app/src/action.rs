//! Controller side-effects.
//!
//! This module defines the [`ControllerAction`] enum, the instructions the
//! [`crate::Controller`] produces for the runtime to execute. The controller
//! itself never sleeps, prints or exits.

use std::time::Duration;

use wayfarer_agent::ConnectionTarget;

use crate::{LogLine, PendingOp, ReconnectTicket};

/// Actions produced by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerAction {
    /// Print a line to the console.
    Log(LogLine),

    /// Wait for `op` to settle, for at most `timeout`.
    ///
    /// Queued input waits too while
    /// [`Controller::input_blocked`](crate::Controller::input_blocked) holds.
    /// When the timeout wins, the runtime feeds
    /// [`ControllerEvent::Deadline`](crate::ControllerEvent::Deadline) back.
    Await {
        /// Outstanding operation.
        op: PendingOp,
        /// Bound on the wait.
        timeout: Duration,
    },

    /// The outstanding operation finished.
    Settled {
        /// Operation that finished.
        op: PendingOp,
    },

    /// Arm the reconnect timer.
    ScheduleReconnect {
        /// Ticket the timer fires with.
        ticket: ReconnectTicket,
        /// Target the reconnect will use.
        target: ConnectionTarget,
        /// Delay before firing.
        after: Duration,
    },

    /// Disarm a previously scheduled reconnect.
    CancelReconnect {
        /// Ticket to disarm.
        ticket: ReconnectTicket,
    },

    /// Clear the visible console.
    ClearScreen,

    /// End the process.
    Exit,
}

impl From<LogLine> for ControllerAction {
    fn from(line: LogLine) -> Self {
        Self::Log(line)
    }
}

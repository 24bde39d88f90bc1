//! Standard controller invariants.

use wayfarer_app::ConnectionState;

use super::{ControllerSnapshot, Invariant, InvariantResult, Violation};

/// A handle is owned exactly when a session exists.
///
/// `Connected` without a handle would make every operation a silent no-op;
/// `Disconnected` with a handle leaks a session nobody will clean up.
pub struct HandleMatchesState;

impl Invariant for HandleMatchesState {
    fn name(&self) -> &'static str {
        "handle_matches_state"
    }

    fn check(&self, state: &ControllerSnapshot) -> InvariantResult {
        let consistent = match state.state {
            ConnectionState::Connected { .. } => state.has_handle,
            ConnectionState::Disconnected => !state.has_handle,
            ConnectionState::Connecting { .. } => true,
        };
        if consistent {
            Ok(())
        } else {
            Err(Violation {
                invariant: self.name(),
                message: format!("state {} with has_handle = {}", state.state, state.has_handle),
            })
        }
    }
}

/// At most one session is open at the agent at any time.
pub struct SingleLiveSession;

impl Invariant for SingleLiveSession {
    fn name(&self) -> &'static str {
        "single_live_session"
    }

    fn check(&self, state: &ControllerSnapshot) -> InvariantResult {
        if state.live_sessions <= 1 {
            Ok(())
        } else {
            Err(Violation {
                invariant: self.name(),
                message: format!("{} sessions open in state {}", state.live_sessions, state.state),
            })
        }
    }
}

/// An outstanding operation belongs to the current session.
///
/// Otherwise input would stay blocked on an operation nothing can settle.
pub struct PendingOpMatchesSession;

impl Invariant for PendingOpMatchesSession {
    fn name(&self) -> &'static str {
        "pending_op_matches_session"
    }

    fn check(&self, state: &ControllerSnapshot) -> InvariantResult {
        match state.pending_op {
            Some(op) if state.state.session() != Some(op.session()) => Err(Violation {
                invariant: self.name(),
                message: format!("{op:?} outstanding in state {}", state.state),
            }),
            _ => Ok(()),
        }
    }
}

/// A reconnect is only scheduled while auto-reconnect is on and a target is
/// known.
pub struct ReconnectNeedsPolicy;

impl Invariant for ReconnectNeedsPolicy {
    fn name(&self) -> &'static str {
        "reconnect_needs_policy"
    }

    fn check(&self, state: &ControllerSnapshot) -> InvariantResult {
        let Some(ticket) = state.pending_reconnect else {
            return Ok(());
        };
        if state.auto_reconnect && state.last_target.is_some() {
            Ok(())
        } else {
            Err(Violation {
                invariant: self.name(),
                message: format!(
                    "{ticket:?} scheduled with auto_reconnect = {} and last_target = {:?}",
                    state.auto_reconnect, state.last_target
                ),
            })
        }
    }
}

//! Observable controller state types.
//!
//! [`ConnectionState`] is the single source of truth for whether a session
//! exists. Every state other than `Disconnected` names the session it refers
//! to, which is how events from abandoned attempts are recognized as stale.

use std::fmt;

use wayfarer_agent::SessionId;

/// Why a connect attempt was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOrigin {
    /// The user issued `join`.
    User,
    /// A scheduled reconnect fired.
    Reconnect,
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session.
    Disconnected,
    /// Session requested, waiting for spawn.
    Connecting {
        /// Session of the attempt.
        session: SessionId,
        /// What started the attempt.
        origin: AttemptOrigin,
    },
    /// Agent spawned.
    Connected {
        /// Live session.
        session: SessionId,
    },
}

impl ConnectionState {
    /// Session the state refers to. `None` when disconnected.
    pub fn session(&self) -> Option<SessionId> {
        match self {
            Self::Disconnected => None,
            Self::Connecting { session, .. } | Self::Connected { session } => Some(*session),
        }
    }

    /// True once the agent has spawned.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// True if no session exists.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// Lower-case state name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting { .. } => "connecting",
            Self::Connected { .. } => "connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.session() {
            Some(session) => write!(f, "{} ({session})", self.label()),
            None => f.write_str(self.label()),
        }
    }
}

/// Identifies one scheduled reconnect. Only the most recent ticket is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReconnectTicket(pub u64);

/// Operation the dispatcher is waiting on before it reads the next line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOp {
    /// Connect attempt waiting for spawn or failure.
    Connect {
        /// Session of the attempt.
        session: SessionId,
    },
    /// Orientation change waiting for completion.
    Look {
        /// Session the look was issued on.
        session: SessionId,
    },
}

impl PendingOp {
    /// Session the operation belongs to.
    pub fn session(&self) -> SessionId {
        match self {
            Self::Connect { session } | Self::Look { session } => *session,
        }
    }
}

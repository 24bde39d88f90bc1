//! Agent error types.

use thiserror::Error;

/// Description fragments that mark a transmission rejection as a signature
/// fault (message-authentication metadata the server refused).
const SIGNATURE_MARKERS: &[&str] =
    &["signature", "chat validation", "secure chat", "profile key", "chat session"];

/// Errors surfaced by an agent client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// The remote end refused the session.
    #[error("connection refused: {0}")]
    Refused(String),

    /// The target could not be used to open a session.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// The session is already closed.
    #[error("session closed")]
    Closed,

    /// The agent has not spawned yet, so world queries are meaningless.
    #[error("agent has not spawned")]
    NotSpawned,

    /// The server rejected an outbound transmission.
    #[error("transmission rejected: {0}")]
    Rejected(String),

    /// Underlying transport failure.
    #[error("transport error: {0}")]
    Transport(String),
}

impl AgentError {
    /// Returns true if this is a signature fault.
    ///
    /// Signature faults are transmission rejections tied to message
    /// authentication. The message may or may not have been delivered; callers
    /// downgrade them to warnings instead of treating them as transport
    /// failures.
    pub fn is_signature_fault(&self) -> bool {
        let description = self.to_string().to_ascii_lowercase();
        SIGNATURE_MARKERS.iter().any(|marker| description.contains(marker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_faults_are_detected_by_description() {
        assert!(AgentError::Rejected("invalid signature for chat".into()).is_signature_fault());
        assert!(AgentError::Transport("Chat validation failed".into()).is_signature_fault());
        assert!(AgentError::Rejected("Secure Chat is enforced".into()).is_signature_fault());
    }

    #[test]
    fn ordinary_faults_are_not_signature_faults() {
        assert!(!AgentError::Closed.is_signature_fault());
        assert!(!AgentError::Rejected("message too long".into()).is_signature_fault());
        assert!(!AgentError::Refused("ECONNREFUSED".into()).is_signature_fault());
    }
}

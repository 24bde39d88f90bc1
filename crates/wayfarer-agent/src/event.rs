//! Agent events and their delivery channels.

use std::fmt;

use tokio::sync::mpsc;

use crate::{AgentError, Fault, FaultSink, Vec3};

/// Identifies one connect attempt.
///
/// Every event an agent emits carries the session it belongs to, so events
/// from an attempt that has been abandoned (timed out, cleaned up) can be
/// told apart from events of the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle and content notifications emitted by an agent.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// The agent entered the world. Position and queries are valid from here.
    Spawn {
        /// Where the agent appeared.
        position: Vec3,
    },

    /// A participant said something.
    Chat {
        /// Speaker name.
        username: String,
        /// Chat text.
        message: String,
    },

    /// Server or system message that is not participant chat.
    Message {
        /// Message text.
        text: String,
    },

    /// Server forcibly terminated the session.
    Kicked {
        /// Reason given by the server.
        reason: String,
    },

    /// Transport or protocol failure.
    Error {
        /// Failure description.
        message: String,
    },

    /// The session ended. No further events follow for this session.
    End {
        /// Why the session ended.
        reason: String,
    },

    /// A requested orientation change finished.
    LookSettled {
        /// Outcome of the orientation change.
        result: Result<(), AgentError>,
    },
}

impl AgentEvent {
    /// Short event name for logs and fault origins.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => "spawn",
            Self::Chat { .. } => "chat",
            Self::Message { .. } => "message",
            Self::Kicked { .. } => "kicked",
            Self::Error { .. } => "error",
            Self::End { .. } => "end",
            Self::LookSettled { .. } => "look",
        }
    }
}

/// An agent event together with the session that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    /// Session that emitted the event.
    pub session: SessionId,
    /// The event.
    pub event: AgentEvent,
}

/// Sending half of the event and fault channels.
///
/// Cheap to clone. The controller hands a session-stamped [`EventSink`] to
/// every session it opens.
#[derive(Debug, Clone)]
pub struct EventBus {
    events: mpsc::UnboundedSender<SessionEvent>,
    faults: FaultSink,
}

/// Receiving half of the event and fault channels.
#[derive(Debug)]
pub struct EventStreams {
    /// Session-stamped agent events.
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    /// Faults reported by supervised tasks and foreign threads.
    pub faults: mpsc::UnboundedReceiver<Fault>,
}

impl EventBus {
    /// Create a connected bus and its receivers.
    pub fn channel() -> (Self, EventStreams) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (faults_tx, faults_rx) = mpsc::unbounded_channel();
        let bus = Self { events: events_tx, faults: faults_tx };
        (bus, EventStreams { events: events_rx, faults: faults_rx })
    }

    /// Sink that stamps events with `session`.
    pub fn for_session(&self, session: SessionId) -> EventSink {
        EventSink { session, events: self.events.clone(), faults: self.faults.clone() }
    }

    /// Fault channel shared by all supervised work.
    pub fn faults(&self) -> &FaultSink {
        &self.faults
    }
}

/// Per-session event sink handed to an agent when its session is opened.
#[derive(Debug, Clone)]
pub struct EventSink {
    session: SessionId,
    events: mpsc::UnboundedSender<SessionEvent>,
    faults: FaultSink,
}

impl EventSink {
    /// Session every emitted event is stamped with.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Deliver an event. Returns false if nobody is listening any more.
    pub fn emit(&self, event: AgentEvent) -> bool {
        self.events.send(SessionEvent { session: self.session, event }).is_ok()
    }

    /// Fault channel for work spawned on behalf of this session.
    pub fn faults(&self) -> &FaultSink {
        &self.faults
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_stamps_session() {
        let (bus, mut streams) = EventBus::channel();
        let sink = bus.for_session(SessionId(7));

        assert!(sink.emit(AgentEvent::Message { text: "hello".into() }));

        let delivered = streams.events.try_recv().ok();
        assert_eq!(
            delivered,
            Some(SessionEvent {
                session: SessionId(7),
                event: AgentEvent::Message { text: "hello".into() }
            })
        );
    }

    #[test]
    fn emit_reports_closed_receiver() {
        let (bus, streams) = EventBus::channel();
        let sink = bus.for_session(SessionId(1));
        drop(streams);

        assert!(!sink.emit(AgentEvent::End { reason: "gone".into() }));
    }
}

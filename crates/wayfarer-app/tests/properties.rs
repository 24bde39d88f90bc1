//! Property-based tests for the controller state machine.
//!
//! Arbitrary interleavings of typed commands, agent events, timer expiries
//! and injected faults must never break the controller invariants.

use proptest::prelude::*;
use wayfarer_agent::{
    AgentError, AgentEvent, EventBus, EventStreams, Fault, FaultOrigin, SessionId, Vec3,
};
use wayfarer_app::{
    Controller, ControllerConfig, ControllerEvent, FaultGuard, PendingOp, ReconnectTicket,
    dispatch,
};
use wayfarer_harness::{ControllerSnapshot, InvariantRegistry, ScriptedConnector};

const LINES: &[&str] = &[
    "join localhost",
    "join play.example.net 25566 1.20.1",
    "leave",
    "say hello there",
    "lookat 1 65 -3",
    "goto 4 64 -2",
    "query players",
    "query position",
    "autoreconnect true",
    "autoreconnect false",
    "help",
    "exit",
    "",
    "bogus",
];

/// One thing that can happen to the controller.
#[derive(Debug, Clone)]
enum Step {
    Line(&'static str),
    RefuseNextOpen,
    Agent { stale: bool, event: AgentEvent },
    Deadline { stale: bool },
    ReconnectDue { stale: bool },
    Fault,
}

fn agent_event_strategy() -> impl Strategy<Value = AgentEvent> {
    prop_oneof![
        3 => Just(AgentEvent::Spawn { position: Vec3::new(0.5, 64.0, 0.5) }),
        1 => Just(AgentEvent::Chat { username: "Alex".into(), message: "hi".into() }),
        1 => Just(AgentEvent::Message { text: "Steve joined the game".into() }),
        1 => Just(AgentEvent::Kicked { reason: "idle".into() }),
        1 => Just(AgentEvent::Error { message: "ECONNRESET".into() }),
        2 => Just(AgentEvent::End { reason: "socketClosed".into() }),
        1 => Just(AgentEvent::LookSettled { result: Ok(()) }),
        1 => Just(AgentEvent::LookSettled {
            result: Err(AgentError::Rejected("not loaded".into())),
        }),
    ]
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        6 => prop::sample::select(LINES).prop_map(Step::Line),
        1 => Just(Step::RefuseNextOpen),
        6 => (any::<bool>(), agent_event_strategy())
            .prop_map(|(stale, event)| Step::Agent { stale, event }),
        2 => any::<bool>().prop_map(|stale| Step::Deadline { stale }),
        2 => any::<bool>().prop_map(|stale| Step::ReconnectDue { stale }),
        1 => Just(Step::Fault),
    ]
}

struct Machine {
    controller: Controller<ScriptedConnector>,
    agent: ScriptedConnector,
    guard: FaultGuard,
    _streams: EventStreams,
}

impl Machine {
    fn new() -> Self {
        let (bus, streams) = EventBus::channel();
        let agent = ScriptedConnector::new();
        agent.set_participants(&["Alex", "Steve"]);
        let controller = Controller::new(agent.clone(), bus, ControllerConfig::default());
        Self { controller, agent, guard: FaultGuard::new(), _streams: streams }
    }

    fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot::capture(&self.controller, self.agent.live_sessions())
    }

    /// Session an event is stamped with: the newest one, or one that is not
    /// current.
    fn session(&self, stale: bool) -> SessionId {
        let newest = self.agent.last_session().unwrap_or(SessionId(0));
        if stale { SessionId(newest.0.wrapping_add(1_000)) } else { newest }
    }

    fn apply(&mut self, step: &Step) {
        match step {
            Step::Line(line) => {
                let _ = dispatch(&mut self.controller, line);
            },
            Step::RefuseNextOpen => {
                self.agent.refuse_next(AgentError::Refused("connect ECONNREFUSED".into()));
            },
            Step::Agent { stale, event } => {
                let session = self.session(*stale);
                let event = ControllerEvent::Agent { session, event: event.clone() };
                let _ = self.controller.handle(event);
            },
            Step::Deadline { stale } => {
                let op = match self.controller.pending_op() {
                    Some(op) if !stale => op,
                    _ => PendingOp::Look { session: self.session(true) },
                };
                let _ = self.controller.handle(ControllerEvent::Deadline(op));
            },
            Step::ReconnectDue { stale } => {
                let ticket = match self.controller.pending_reconnect() {
                    Some(ticket) if !stale => ticket,
                    _ => ReconnectTicket(u64::MAX),
                };
                let _ = self.controller.handle(ControllerEvent::ReconnectDue(ticket));
            },
            Step::Fault => {
                let fault = Fault::new(FaultOrigin::Runtime, "injected");
                let _ = self.guard.recover(&mut self.controller, &fault);
            },
        }
    }
}

proptest! {
    /// Controller invariants hold after every step of any sequence.
    #[test]
    fn prop_controller_invariants_hold(steps in prop::collection::vec(step_strategy(), 0..60)) {
        let mut machine = Machine::new();
        let invariants = InvariantRegistry::standard();

        for step in &steps {
            machine.apply(step);

            let snapshot = machine.snapshot();
            prop_assert!(
                invariants.check_all(&snapshot).is_ok(),
                "Invariant violated after {:?}: {:?}", step, invariants.check_all(&snapshot)
            );
        }
    }

    /// A disconnected controller leaves no session open at the agent.
    #[test]
    fn prop_disconnected_means_no_live_session(
        steps in prop::collection::vec(step_strategy(), 0..60)
    ) {
        let mut machine = Machine::new();

        for step in &steps {
            machine.apply(step);

            let snapshot = machine.snapshot();
            if snapshot.state.is_disconnected() {
                prop_assert_eq!(snapshot.live_sessions, 0, "after {:?}", step);
                prop_assert!(snapshot.pending_op.is_none());
            }
        }
    }

    /// Events stamped with a session that is not current change nothing.
    #[test]
    fn prop_foreign_session_events_are_inert(
        prefix in prop::collection::vec(step_strategy(), 0..30),
        event in agent_event_strategy(),
    ) {
        let mut machine = Machine::new();
        for step in &prefix {
            machine.apply(step);
        }

        let before = machine.snapshot();
        let session = machine.session(true);
        let actions = machine.controller.handle(ControllerEvent::Agent { session, event });

        prop_assert!(actions.is_empty());
        prop_assert_eq!(machine.snapshot(), before);
    }
}

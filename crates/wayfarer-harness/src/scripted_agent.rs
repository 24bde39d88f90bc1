//! Scripted agent for controller tests.
//!
//! Nothing happens on its own: sessions open instantly, and every event is
//! emitted by the test through [`ScriptedConnector::emit`] (or automatically
//! on open with [`ScriptedConnector::auto_spawn_at`]). Every call the
//! controller makes into the agent is recorded as an [`AgentCall`].

use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use wayfarer_agent::{
    AgentConnector, AgentError, AgentEvent, AgentHandle, BlockPos, ConnectionTarget, EventSink,
    MovementProfile, Pathfinder, SessionId, Vec3, WorldData,
};

/// Username scripted agents spawn with unless overridden.
pub const DEFAULT_USERNAME: &str = "Scout";

/// A call the controller made into the agent.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentCall {
    /// A session was opened.
    Open {
        /// Session the controller stamped it with.
        session: SessionId,
        /// Requested target.
        target: ConnectionTarget,
    },
    /// Chat was sent.
    Chat {
        /// Session it was sent on.
        session: SessionId,
        /// Transmitted text.
        text: String,
    },
    /// An orientation change was requested.
    LookAt {
        /// Session it was requested on.
        session: SessionId,
        /// Point to face.
        target: Vec3,
    },
    /// A movement profile was installed.
    SetProfile {
        /// Session it was installed on.
        session: SessionId,
        /// Installed profile.
        profile: MovementProfile,
    },
    /// A movement goal was set.
    SetGoal {
        /// Session it was set on.
        session: SessionId,
        /// Goal block.
        goal: BlockPos,
    },
    /// The session was asked to quit.
    Quit {
        /// Session asked.
        session: SessionId,
        /// Quit reason.
        reason: String,
    },
    /// Event delivery was detached.
    Detach {
        /// Session detached.
        session: SessionId,
    },
}

impl AgentCall {
    /// Session the call was made on.
    pub fn session(&self) -> SessionId {
        match self {
            Self::Open { session, .. }
            | Self::Chat { session, .. }
            | Self::LookAt { session, .. }
            | Self::SetProfile { session, .. }
            | Self::SetGoal { session, .. }
            | Self::Quit { session, .. }
            | Self::Detach { session } => *session,
        }
    }
}

#[derive(Debug)]
struct Script {
    username: String,
    calls: Vec<AgentCall>,
    sinks: Vec<EventSink>,
    /// Sessions whose handle is still alive and attached.
    live: BTreeSet<SessionId>,
    refuse_next: Option<AgentError>,
    chat_error: Option<AgentError>,
    look_error: Option<AgentError>,
    goal_error: Option<AgentError>,
    auto_spawn: Option<Vec3>,
    position: Option<Vec3>,
    participants: Vec<String>,
    world: WorldData,
    panic_in_callbacks: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            calls: Vec::new(),
            sinks: Vec::new(),
            live: BTreeSet::new(),
            refuse_next: None,
            chat_error: None,
            look_error: None,
            goal_error: None,
            auto_spawn: None,
            position: None,
            participants: Vec::new(),
            world: WorldData { version: "1.20.4".to_string(), min_y: -64, max_y: 320 },
            panic_in_callbacks: false,
        }
    }
}

type SharedScript = Arc<Mutex<Script>>;

fn lock(script: &SharedScript) -> MutexGuard<'_, Script> {
    script.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Connector whose world is driven by the test.
///
/// Clones share the same script, so a test keeps one clone for control and
/// hands another to the controller.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnector {
    script: SharedScript,
}

impl ScriptedConnector {
    /// Create a connector with default behavior: every open succeeds and
    /// nothing is emitted until the test says so.
    pub fn new() -> Self {
        Self::default()
    }

    /// Name sessions spawn with.
    pub fn set_username(&self, username: impl Into<String>) {
        lock(&self.script).username = username.into();
    }

    /// Make the next `open` fail with `error`.
    pub fn refuse_next(&self, error: AgentError) {
        lock(&self.script).refuse_next = Some(error);
    }

    /// Make every `chat` fail with `error`. `None` restores success.
    pub fn fail_chat_with(&self, error: Option<AgentError>) {
        lock(&self.script).chat_error = error;
    }

    /// Make every `look_at` fail with `error`. `None` restores success.
    pub fn fail_look_with(&self, error: Option<AgentError>) {
        lock(&self.script).look_error = error;
    }

    /// Make every `set_goal` fail with `error`. `None` restores success.
    pub fn fail_goal_with(&self, error: Option<AgentError>) {
        lock(&self.script).goal_error = error;
    }

    /// Emit `Spawn` at `position` as soon as a session opens.
    pub fn auto_spawn_at(&self, position: Option<Vec3>) {
        lock(&self.script).auto_spawn = position;
    }

    /// Position every handle reports.
    pub fn set_position(&self, position: Option<Vec3>) {
        lock(&self.script).position = position;
    }

    /// Participants every handle reports, excluding the agent itself.
    pub fn set_participants(&self, names: &[&str]) {
        lock(&self.script).participants = names.iter().map(|n| (*n).to_string()).collect();
    }

    /// Make `username()` panic, which is what the controller calls while
    /// formatting chat events.
    pub fn panic_in_callbacks(&self, enabled: bool) {
        lock(&self.script).panic_in_callbacks = enabled;
    }

    /// Deliver `event` on the sink of `session`. Returns false if the session
    /// was never opened or nobody is listening.
    pub fn emit(&self, session: SessionId, event: AgentEvent) -> bool {
        let sink = lock(&self.script).sinks.iter().find(|s| s.session() == session).cloned();
        sink.is_some_and(|sink| sink.emit(event))
    }

    /// Every call recorded so far.
    pub fn calls(&self) -> Vec<AgentCall> {
        lock(&self.script).calls.clone()
    }

    /// Targets of every open, in order.
    pub fn opened_targets(&self) -> Vec<ConnectionTarget> {
        lock(&self.script)
            .calls
            .iter()
            .filter_map(|call| match call {
                AgentCall::Open { target, .. } => Some(target.clone()),
                _ => None,
            })
            .collect()
    }

    /// Texts of every chat sent, in order.
    pub fn chats(&self) -> Vec<String> {
        lock(&self.script)
            .calls
            .iter()
            .filter_map(|call| match call {
                AgentCall::Chat { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Session of the most recent open.
    pub fn last_session(&self) -> Option<SessionId> {
        lock(&self.script).sinks.last().map(EventSink::session)
    }

    /// Number of sessions still open and attached.
    pub fn live_sessions(&self) -> usize {
        lock(&self.script).live.len()
    }
}

impl AgentConnector for ScriptedConnector {
    type Handle = ScriptedHandle;

    fn open(
        &mut self,
        target: &ConnectionTarget,
        sink: EventSink,
    ) -> Result<Self::Handle, AgentError> {
        let session = sink.session();
        let mut script = lock(&self.script);
        script.calls.push(AgentCall::Open { session, target: target.clone() });

        if let Some(error) = script.refuse_next.take() {
            tracing::debug!(%session, %error, "scripted open refused");
            return Err(error);
        }

        script.live.insert(session);
        script.sinks.push(sink.clone());
        if let Some(position) = script.auto_spawn {
            script.position = Some(position);
            sink.emit(AgentEvent::Spawn { position });
        }

        Ok(ScriptedHandle {
            session,
            username: script.username.clone(),
            script: Arc::clone(&self.script),
            pathfinder: ScriptedPathfinder { session, script: Arc::clone(&self.script) },
        })
    }
}

/// Handle to a scripted session.
#[derive(Debug)]
pub struct ScriptedHandle {
    session: SessionId,
    username: String,
    script: SharedScript,
    pathfinder: ScriptedPathfinder,
}

impl ScriptedHandle {
    /// Session this handle belongs to.
    pub fn session(&self) -> SessionId {
        self.session
    }

    fn record(&self, call: AgentCall) -> MutexGuard<'_, Script> {
        let mut script = lock(&self.script);
        script.calls.push(call);
        script
    }
}

impl AgentHandle for ScriptedHandle {
    #[allow(clippy::panic)]
    fn username(&self) -> &str {
        if lock(&self.script).panic_in_callbacks {
            panic!("scripted callback failure");
        }
        &self.username
    }

    fn chat(&mut self, text: &str) -> Result<(), AgentError> {
        let call = AgentCall::Chat { session: self.session, text: text.to_string() };
        match self.record(call).chat_error.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn look_at(&mut self, target: Vec3) -> Result<(), AgentError> {
        let call = AgentCall::LookAt { session: self.session, target };
        match self.record(call).look_error.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn position(&self) -> Option<Vec3> {
        lock(&self.script).position
    }

    fn participants(&self) -> Vec<String> {
        let script = lock(&self.script);
        std::iter::once(self.username.clone()).chain(script.participants.iter().cloned()).collect()
    }

    fn world_data(&self) -> WorldData {
        lock(&self.script).world.clone()
    }

    fn pathfinder(&mut self) -> &mut dyn Pathfinder {
        &mut self.pathfinder
    }

    fn quit(&mut self, reason: &str) -> Result<(), AgentError> {
        self.record(AgentCall::Quit { session: self.session, reason: reason.to_string() });
        Ok(())
    }

    fn detach(&mut self) -> Result<(), AgentError> {
        let mut script = self.record(AgentCall::Detach { session: self.session });
        script.live.remove(&self.session);
        Ok(())
    }
}

impl Drop for ScriptedHandle {
    fn drop(&mut self) {
        lock(&self.script).live.remove(&self.session);
    }
}

/// Pathfinder of a scripted session.
#[derive(Debug)]
pub struct ScriptedPathfinder {
    session: SessionId,
    script: SharedScript,
}

impl Pathfinder for ScriptedPathfinder {
    fn set_movement_profile(&mut self, profile: MovementProfile) {
        lock(&self.script).calls.push(AgentCall::SetProfile { session: self.session, profile });
    }

    fn set_goal(&mut self, goal: BlockPos) -> Result<(), AgentError> {
        let mut script = lock(&self.script);
        script.calls.push(AgentCall::SetGoal { session: self.session, goal });
        match script.goal_error.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

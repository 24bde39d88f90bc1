//! Connection-lifecycle controller.
//!
//! This module defines the [`Controller`], which owns at most one agent
//! session and decides everything about its lifecycle: when a connect attempt
//! may start, what a spawn, kick or end means in each state, when to schedule
//! a reconnect and how to tear a session down.
//!
//! This is a pure state machine: user operations and [`ControllerEvent`]s go
//! in, [`ControllerAction`]s come out. Waiting, timing and printing are the
//! runtime's job.
//!
//! # Invariants
//!
//! - `Connected` implies a handle is owned; `Disconnected` implies none is.
//! - A connect attempt only starts from `Disconnected`.
//! - The last target is recorded when an attempt starts, not when it succeeds.
//! - Cleanup releases the handle and forces `Disconnected` before any reconnect
//!   is scheduled.
//! - Events stamped with a session other than the current one are ignored.

use std::fmt;

use wayfarer_agent::{
    AgentConnector, AgentEvent, AgentHandle, ConnectionTarget, EventBus, MovementProfile, SessionId,
    Vec3,
};

use crate::{
    AttemptOrigin, ConnectionState, ControllerAction, ControllerConfig, ControllerEvent, LogLine,
    PendingOp, ReconnectTicket,
};

/// Connection-lifecycle controller.
pub struct Controller<C: AgentConnector> {
    connector: C,
    bus: EventBus,
    config: ControllerConfig,
    state: ConnectionState,
    /// Handle of the current session. `None` when disconnected.
    handle: Option<C::Handle>,
    /// Most recently attempted target, reused by reconnects.
    last_target: Option<ConnectionTarget>,
    auto_reconnect: bool,
    /// Operation awaiting completion or its deadline.
    pending_op: Option<PendingOp>,
    /// Most recently scheduled reconnect. Older tickets are stale.
    pending_reconnect: Option<ReconnectTicket>,
    next_session: u64,
    next_ticket: u64,
}

impl<C: AgentConnector> Controller<C> {
    /// Create a disconnected controller.
    ///
    /// Sessions opened through `connector` deliver their events on `bus`.
    pub fn new(connector: C, bus: EventBus, config: ControllerConfig) -> Self {
        Self {
            connector,
            bus,
            config,
            state: ConnectionState::Disconnected,
            handle: None,
            last_target: None,
            auto_reconnect: false,
            pending_op: None,
            pending_reconnect: None,
            next_session: 0,
            next_ticket: 0,
        }
    }

    /// Start a user-requested connect attempt.
    pub fn connect(&mut self, target: ConnectionTarget) -> Vec<ControllerAction> {
        self.start_attempt(target, AttemptOrigin::User)
    }

    fn start_attempt(
        &mut self,
        target: ConnectionTarget,
        origin: AttemptOrigin,
    ) -> Vec<ControllerAction> {
        if !self.state.is_disconnected() {
            let current =
                self.last_target.as_ref().map_or_else(String::new, |t| format!(" to {t}"));
            return vec![
                LogLine::error(format!(
                    "Already {}{current}. Use 'leave' first",
                    self.state.label()
                ))
                .into(),
            ];
        }
        if target.host.trim().is_empty() {
            return vec![LogLine::warning("Cannot connect: host is empty").into()];
        }

        let mut actions = self.cancel_reconnect();
        let session = self.allocate_session();
        self.last_target = Some(target.clone());
        self.state = ConnectionState::Connecting { session, origin };
        actions.push(LogLine::info(format!("Connecting to {target}...")).into());

        tracing::debug!(%session, %target, ?origin, "opening agent session");
        match self.connector.open(&target, self.bus.for_session(session)) {
            Ok(handle) => {
                self.handle = Some(handle);
                let op = PendingOp::Connect { session };
                self.pending_op = Some(op);
                actions.push(ControllerAction::Await { op, timeout: self.config.connect_timeout });
            },
            Err(e) => {
                actions.push(LogLine::error(format!("Connection failed: {e}")).into());
                actions.extend(self.fail_attempt(origin));
            },
        }
        actions
    }

    /// Tear down a failed attempt. Reconnect-driven attempts keep retrying.
    fn fail_attempt(&mut self, origin: AttemptOrigin) -> Vec<ControllerAction> {
        let mut actions = self.cleanup();
        if origin == AttemptOrigin::Reconnect {
            actions.extend(self.try_reconnect());
        }
        actions
    }

    /// End the current session on request.
    ///
    /// Always cancels a pending reconnect, so a manual disconnect is never
    /// followed by an automatic reconnect. An attempt still in progress is
    /// abandoned.
    pub fn disconnect(&mut self) -> Vec<ControllerAction> {
        let had_reconnect = self.pending_reconnect.is_some();
        let mut actions = self.cancel_reconnect();

        if let ConnectionState::Connecting { session, .. } = self.state {
            tracing::debug!(%session, "abandoning connect attempt");
            if let Some(handle) = self.handle.as_mut()
                && let Err(e) = handle.quit("disconnect")
            {
                tracing::debug!(error = %e, "quit during connect attempt failed");
            }
            actions.extend(self.cleanup());
            actions.push(LogLine::info("Connect attempt cancelled").into());
            return actions;
        }
        if !self.state.is_connected() {
            let line = if had_reconnect {
                LogLine::info("Pending reconnect cancelled")
            } else {
                LogLine::warning("Not connected")
            };
            actions.push(line.into());
            return actions;
        }

        if let Some(handle) = self.handle.as_mut()
            && let Err(e) = handle.quit("disconnect")
        {
            actions.push(LogLine::warning(format!("Quit request failed: {e}")).into());
        }
        actions.extend(self.cleanup());
        actions.push(LogLine::success("Disconnected").into());
        actions
    }

    /// Release the session and force `Disconnected`.
    ///
    /// Idempotent. Settles whatever operation was outstanding.
    pub fn cleanup(&mut self) -> Vec<ControllerAction> {
        if let Some(mut handle) = self.handle.take()
            && let Err(e) = handle.detach()
        {
            tracing::debug!(error = %e, "detaching agent session failed");
        }
        self.state = ConnectionState::Disconnected;

        match self.pending_op.take() {
            Some(op) => vec![ControllerAction::Settled { op }],
            None => vec![],
        }
    }

    /// Schedule one reconnect to the last target if auto-reconnect is on.
    ///
    /// Replaces any reconnect already scheduled.
    pub fn try_reconnect(&mut self) -> Vec<ControllerAction> {
        if !self.auto_reconnect {
            return vec![];
        }
        let Some(target) = self.last_target.clone() else {
            return vec![];
        };

        let mut actions = self.cancel_reconnect();
        let ticket = self.allocate_ticket();
        self.pending_reconnect = Some(ticket);

        let after = self.config.reconnect_delay;
        actions.push(LogLine::info(format!("Reconnecting to {target} in {after:?}")).into());
        actions.push(ControllerAction::ScheduleReconnect { ticket, target, after });
        actions
    }

    fn cancel_reconnect(&mut self) -> Vec<ControllerAction> {
        match self.pending_reconnect.take() {
            Some(ticket) => vec![ControllerAction::CancelReconnect { ticket }],
            None => vec![],
        }
    }

    /// Send chat, truncated to the configured length.
    pub fn say(&mut self, message: &str) -> Vec<ControllerAction> {
        let limit = self.config.max_chat_units;
        let Some(handle) = self.connected_handle() else {
            return vec![not_connected()];
        };

        let message = message.trim();
        if message.is_empty() {
            return vec![LogLine::warning("Nothing to say").into()];
        }

        let text = truncate_utf16(message, limit);
        let mut actions = Vec::new();
        if text.len() < message.len() {
            let line = format!("Message truncated to {limit} UTF-16 units");
            actions.push(LogLine::info(line).into());
        }

        match handle.chat(text) {
            Ok(()) => {},
            Err(e) if e.is_signature_fault() => {
                tracing::debug!(error = %e, "chat signing rejected message");
                let line =
                    format!("Chat signing failed, message may not have been delivered ({e})");
                actions.push(LogLine::warning(line).into());
            },
            Err(e) => actions.push(LogLine::error(format!("Failed to send chat: {e}")).into()),
        }
        actions
    }

    /// Report `position` or `players`.
    pub fn query(&mut self, kind: &str) -> Vec<ControllerAction> {
        let Some(handle) = self.connected_handle() else {
            return vec![not_connected()];
        };

        let line = if kind.eq_ignore_ascii_case("position") {
            match handle.position() {
                Some(position) => LogLine::info(format!("Position: {position}")),
                None => LogLine::warning("Position is not known yet"),
            }
        } else if kind.eq_ignore_ascii_case("players") {
            let me = handle.username().to_string();
            let others: Vec<String> =
                handle.participants().into_iter().filter(|name| *name != me).collect();
            if others.is_empty() {
                LogLine::info("No other players online")
            } else {
                LogLine::info(format!("Players ({}): {}", others.len(), others.join(", ")))
            }
        } else {
            LogLine::warning(format!("Unknown query '{kind}'. Expected position or players"))
        };
        vec![line.into()]
    }

    /// Turn to face `target`. Input waits until the look settles.
    pub fn look_at(&mut self, target: Vec3) -> Vec<ControllerAction> {
        let ConnectionState::Connected { session } = self.state else {
            return vec![not_connected()];
        };
        if !target.is_finite() {
            return vec![not_finite()];
        }

        let timeout = self.config.connect_timeout;
        let Some(handle) = self.handle.as_mut() else {
            return vec![not_connected()];
        };

        match handle.look_at(target) {
            Ok(()) => {
                let op = PendingOp::Look { session };
                self.pending_op = Some(op);
                vec![
                    LogLine::info(format!("Looking at {target}")).into(),
                    ControllerAction::Await { op, timeout },
                ]
            },
            Err(e) => vec![LogLine::error(format!("Look failed: {e}")).into()],
        }
    }

    /// Start walking to the block containing `target`. Completion is not
    /// observed.
    pub fn goto(&mut self, target: Vec3) -> Vec<ControllerAction> {
        let Some(handle) = self.connected_handle() else {
            return vec![not_connected()];
        };
        if !target.is_finite() {
            return vec![not_finite()];
        }

        let block = target.floored();
        let profile = MovementProfile::for_world(&handle.world_data());
        let pathfinder = handle.pathfinder();
        pathfinder.set_movement_profile(profile);

        let line = match pathfinder.set_goal(block) {
            Ok(()) => LogLine::info(format!("Moving to {block}")),
            Err(e) => LogLine::error(format!("Cannot move to {block}: {e}")),
        };
        vec![line.into()]
    }

    /// Toggle the reconnect policy. Turning it off cancels a pending
    /// reconnect.
    pub fn set_auto_reconnect(&mut self, enabled: bool) -> Vec<ControllerAction> {
        self.auto_reconnect = enabled;
        let mut actions = if enabled { vec![] } else { self.cancel_reconnect() };
        let state = if enabled { "enabled" } else { "disabled" };
        actions.push(LogLine::success(format!("Auto-reconnect {state}")).into());
        actions
    }

    /// Best-effort teardown before the process exits.
    pub fn shutdown(&mut self) -> Vec<ControllerAction> {
        let was_connected = self.state.is_connected();
        let mut actions = self.cancel_reconnect();

        if let Some(handle) = self.handle.as_mut()
            && let Err(e) = handle.quit("exit")
        {
            tracing::debug!(error = %e, "quit during shutdown failed");
        }
        actions.extend(self.cleanup());

        if was_connected {
            actions.push(LogLine::success("Disconnected").into());
        }
        actions
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: ControllerEvent) -> Vec<ControllerAction> {
        match event {
            ControllerEvent::Agent { session, event } => {
                if self.state.session() != Some(session) {
                    tracing::debug!(
                        %session,
                        event = event.name(),
                        state = %self.state,
                        "ignoring event from stale session"
                    );
                    return vec![];
                }
                self.handle_agent(event)
            },
            ControllerEvent::Deadline(op) => self.handle_deadline(op),
            ControllerEvent::ReconnectDue(ticket) => self.handle_reconnect_due(ticket),
        }
    }

    fn handle_agent(&mut self, event: AgentEvent) -> Vec<ControllerAction> {
        match event {
            AgentEvent::Spawn { position } => match self.state {
                ConnectionState::Connecting { session, .. } => {
                    self.state = ConnectionState::Connected { session };
                    let line = LogLine::success(format!("Spawned at {position}"));
                    let mut actions = vec![line.into()];
                    actions.extend(self.settle(PendingOp::Connect { session }));
                    actions
                },
                ConnectionState::Connected { .. } => {
                    vec![LogLine::event(format!("Respawned at {position}")).into()]
                },
                ConnectionState::Disconnected => vec![],
            },
            AgentEvent::Chat { username, message } => {
                let own = self.handle.as_ref().is_some_and(|h| h.username() == username);
                let line = if own {
                    LogLine::chat(format!("{username} (you): {message}"))
                } else {
                    LogLine::chat(format!("{username}: {message}"))
                };
                vec![line.into()]
            },
            AgentEvent::Message { text } => vec![LogLine::event(text).into()],
            AgentEvent::Kicked { reason } => {
                let mut actions = vec![LogLine::warning(format!("Kicked: {reason}")).into()];
                actions.extend(self.cleanup());
                actions.extend(self.try_reconnect());
                actions
            },
            AgentEvent::Error { message } => match self.state {
                ConnectionState::Connecting { origin, .. } => {
                    let mut actions =
                        vec![LogLine::error(format!("Connection error: {message}")).into()];
                    actions.extend(self.fail_attempt(origin));
                    actions
                },
                ConnectionState::Connected { .. } | ConnectionState::Disconnected => {
                    vec![LogLine::error(format!("Agent error: {message}")).into()]
                },
            },
            AgentEvent::End { reason } => match self.state {
                ConnectionState::Connected { .. } => {
                    let line = LogLine::warning(format!("Disconnected: {reason}"));
                    let mut actions = vec![line.into()];
                    actions.extend(self.cleanup());
                    actions.extend(self.try_reconnect());
                    actions
                },
                ConnectionState::Connecting { origin, .. } => {
                    let line = LogLine::error(format!("Connection closed before spawn: {reason}"));
                    let mut actions = vec![line.into()];
                    actions.extend(self.fail_attempt(origin));
                    actions
                },
                ConnectionState::Disconnected => vec![],
            },
            AgentEvent::LookSettled { result } => {
                let Some(op @ PendingOp::Look { .. }) = self.pending_op else {
                    tracing::debug!("look settled with no look outstanding");
                    return vec![];
                };
                self.pending_op = None;
                let line = match result {
                    Ok(()) => LogLine::success("Look complete"),
                    Err(e) => LogLine::error(format!("Look failed: {e}")),
                };
                vec![line.into(), ControllerAction::Settled { op }]
            },
        }
    }

    fn handle_deadline(&mut self, op: PendingOp) -> Vec<ControllerAction> {
        if self.pending_op != Some(op) {
            tracing::debug!(?op, "ignoring deadline of settled operation");
            return vec![];
        }

        let timeout = self.config.connect_timeout;
        match (op, self.state) {
            (PendingOp::Connect { .. }, ConnectionState::Connecting { origin, .. }) => {
                let mut actions =
                    vec![LogLine::error(format!("Connection timed out after {timeout:?}")).into()];
                actions.extend(self.fail_attempt(origin));
                actions
            },
            (PendingOp::Look { .. }, _) => {
                self.pending_op = None;
                vec![
                    LogLine::warning(format!("Look did not finish within {timeout:?}")).into(),
                    ControllerAction::Settled { op },
                ]
            },
            (PendingOp::Connect { .. }, _) => self.settle(op),
        }
    }

    fn handle_reconnect_due(&mut self, ticket: ReconnectTicket) -> Vec<ControllerAction> {
        if self.pending_reconnect != Some(ticket) {
            tracing::debug!(?ticket, "ignoring superseded reconnect");
            return vec![];
        }
        self.pending_reconnect = None;

        if !self.auto_reconnect {
            tracing::debug!(?ticket, "auto-reconnect was turned off");
            return vec![];
        }
        if !self.state.is_disconnected() {
            tracing::debug!(?ticket, state = %self.state, "already connected, skipping reconnect");
            return vec![];
        }
        let Some(target) = self.last_target.clone() else {
            return vec![];
        };
        self.start_attempt(target, AttemptOrigin::Reconnect)
    }

    fn settle(&mut self, op: PendingOp) -> Vec<ControllerAction> {
        if self.pending_op == Some(op) {
            self.pending_op = None;
            vec![ControllerAction::Settled { op }]
        } else {
            vec![]
        }
    }

    fn connected_handle(&mut self) -> Option<&mut C::Handle> {
        if self.state.is_connected() { self.handle.as_mut() } else { None }
    }

    fn allocate_session(&mut self) -> SessionId {
        self.next_session += 1;
        SessionId(self.next_session)
    }

    fn allocate_ticket(&mut self) -> ReconnectTicket {
        self.next_ticket += 1;
        ReconnectTicket(self.next_ticket)
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Most recently attempted target. `None` before the first `join`.
    pub fn last_target(&self) -> Option<&ConnectionTarget> {
        self.last_target.as_ref()
    }

    /// Whether auto-reconnect is enabled.
    pub fn auto_reconnect(&self) -> bool {
        self.auto_reconnect
    }

    /// Handle of the current session. `None` when disconnected.
    pub fn handle_ref(&self) -> Option<&C::Handle> {
        self.handle.as_ref()
    }

    /// Whether a session handle is owned.
    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    /// Operation waiting on completion or its deadline.
    pub fn pending_op(&self) -> Option<PendingOp> {
        self.pending_op
    }

    /// Whether queued input lines must wait.
    ///
    /// Only operations started by a command hold input. A reconnect attempt
    /// runs behind the prompt.
    pub fn input_blocked(&self) -> bool {
        match self.pending_op {
            Some(PendingOp::Look { .. }) => true,
            Some(PendingOp::Connect { .. }) => !matches!(
                self.state,
                ConnectionState::Connecting { origin: AttemptOrigin::Reconnect, .. }
            ),
            None => false,
        }
    }

    /// Ticket of the scheduled reconnect. `None` if nothing is scheduled.
    pub fn pending_reconnect(&self) -> Option<ReconnectTicket> {
        self.pending_reconnect
    }

    /// Controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Event bus sessions deliver on.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}

impl<C: AgentConnector> fmt::Debug for Controller<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("state", &self.state)
            .field("last_target", &self.last_target)
            .field("auto_reconnect", &self.auto_reconnect)
            .field("has_handle", &self.handle.is_some())
            .field("pending_op", &self.pending_op)
            .field("pending_reconnect", &self.pending_reconnect)
            .finish_non_exhaustive()
    }
}

fn not_connected() -> ControllerAction {
    LogLine::warning("Not connected. Use 'join' first").into()
}

fn not_finite() -> ControllerAction {
    LogLine::warning("Coordinates must be finite numbers").into()
}

/// Longest prefix of `text` that fits in `limit` UTF-16 code units without
/// splitting a character.
fn truncate_utf16(text: &str, limit: usize) -> &str {
    let mut units = 0;
    for (index, ch) in text.char_indices() {
        units += ch.len_utf16();
        if units > limit {
            return &text[..index];
        }
    }
    text
}

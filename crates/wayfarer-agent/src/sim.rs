//! In-process simulated world.
//!
//! Runs one tokio task per session and talks to it over channels. No network:
//! the task plays the server's part (spawn, chat echo, orientation, movement)
//! so the console can be exercised end to end without a real world server.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{
    sync::mpsc,
    task::AbortHandle,
    time::{MissedTickBehavior, interval, sleep},
};

use crate::{
    AgentConnector, AgentError, AgentEvent, AgentHandle, BlockPos, ConnectionTarget, EventSink,
    MovementProfile, Pathfinder, Vec3, WorldData, spawn_supervised,
};

/// Simulated world configuration.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Name the agent spawns with.
    pub username: String,
    /// Delay between opening a session and the spawn event.
    pub spawn_delay: Duration,
    /// Where the agent spawns.
    pub spawn_point: Vec3,
    /// Other participants present in the world.
    pub roster: Vec<String>,
    /// Movement step interval. The agent moves at most one block per axis
    /// per tick.
    pub tick: Duration,
    /// Time an orientation change takes.
    pub look_delay: Duration,
    /// Version reported when the target does not pin one.
    pub default_version: String,
    /// Hosts that refuse connections.
    pub refused_hosts: Vec<String>,
    /// Longest chat message accepted, in UTF-16 code units.
    pub max_chat_units: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            username: "Wayfarer".to_string(),
            spawn_delay: Duration::from_millis(750),
            spawn_point: Vec3::new(0.5, 64.0, 0.5),
            roster: vec!["Alex".to_string(), "Steve".to_string()],
            tick: Duration::from_millis(250),
            look_delay: Duration::from_millis(100),
            default_version: "1.20.4".to_string(),
            refused_hosts: Vec::new(),
            max_chat_units: 256,
        }
    }
}

/// Opens sessions against the simulated world.
#[derive(Debug, Clone, Default)]
pub struct SimConnector {
    config: SimConfig,
}

impl SimConnector {
    /// Create a connector with the given world configuration.
    pub fn new(config: SimConfig) -> Self {
        Self { config }
    }

    /// World configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}

impl AgentConnector for SimConnector {
    type Handle = SimHandle;

    fn open(
        &mut self,
        target: &ConnectionTarget,
        sink: EventSink,
    ) -> Result<Self::Handle, AgentError> {
        if target.host.trim().is_empty() {
            return Err(AgentError::InvalidTarget("empty host".to_string()));
        }

        let shared = Arc::new(Mutex::new(Shared::default()));
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let refused = self.config.refused_hosts.iter().any(|host| host == &target.host);
        let version =
            target.version.clone().unwrap_or_else(|| self.config.default_version.clone());

        let session = Session {
            config: self.config.clone(),
            target: target.clone(),
            shared: Arc::clone(&shared),
            sink: sink.clone(),
        };
        let task = spawn_supervised(
            format!("sim session {}", sink.session()),
            sink.faults().clone(),
            session.run(refused, commands_rx),
        );

        tracing::debug!(session = %sink.session(), %target, refused, "sim session opened");

        Ok(SimHandle {
            username: self.config.username.clone(),
            roster: self.config.roster.clone(),
            max_chat_units: self.config.max_chat_units,
            version,
            shared,
            commands: commands_tx.clone(),
            pathfinder: SimPathfinder { commands: commands_tx, profile: None },
            task: task.abort_handle(),
        })
    }
}

/// State shared between a handle and its session task.
#[derive(Debug, Default)]
struct Shared {
    position: Option<Vec3>,
    detached: bool,
    ended: bool,
}

type SharedState = Arc<Mutex<Shared>>;

fn lock(shared: &SharedState) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Requests from a handle to its session task.
#[derive(Debug)]
enum SimCommand {
    Chat(String),
    Look(Vec3),
    Goal(BlockPos),
    Quit(String),
}

/// Handle to a simulated session.
#[derive(Debug)]
pub struct SimHandle {
    username: String,
    roster: Vec<String>,
    max_chat_units: usize,
    version: String,
    shared: SharedState,
    commands: mpsc::UnboundedSender<SimCommand>,
    pathfinder: SimPathfinder,
    task: AbortHandle,
}

impl SimHandle {
    fn send(&self, command: SimCommand) -> Result<(), AgentError> {
        if lock(&self.shared).ended {
            return Err(AgentError::Closed);
        }
        self.commands.send(command).map_err(|_| AgentError::Closed)
    }
}

impl AgentHandle for SimHandle {
    fn username(&self) -> &str {
        &self.username
    }

    fn chat(&mut self, text: &str) -> Result<(), AgentError> {
        if text.encode_utf16().count() > self.max_chat_units {
            return Err(AgentError::Rejected("message too long".to_string()));
        }
        self.send(SimCommand::Chat(text.to_string()))
    }

    fn look_at(&mut self, target: Vec3) -> Result<(), AgentError> {
        if self.position().is_none() {
            return Err(AgentError::NotSpawned);
        }
        self.send(SimCommand::Look(target))
    }

    fn position(&self) -> Option<Vec3> {
        lock(&self.shared).position
    }

    fn participants(&self) -> Vec<String> {
        if self.position().is_none() {
            return Vec::new();
        }
        std::iter::once(self.username.clone()).chain(self.roster.iter().cloned()).collect()
    }

    fn world_data(&self) -> WorldData {
        WorldData { version: self.version.clone(), min_y: -64, max_y: 320 }
    }

    fn pathfinder(&mut self) -> &mut dyn Pathfinder {
        &mut self.pathfinder
    }

    fn quit(&mut self, reason: &str) -> Result<(), AgentError> {
        self.send(SimCommand::Quit(reason.to_string()))
    }

    fn detach(&mut self) -> Result<(), AgentError> {
        lock(&self.shared).detached = true;
        Ok(())
    }
}

impl Drop for SimHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Movement planner of a simulated agent.
#[derive(Debug)]
pub struct SimPathfinder {
    commands: mpsc::UnboundedSender<SimCommand>,
    profile: Option<MovementProfile>,
}

impl SimPathfinder {
    /// Installed movement profile. `None` until one is set.
    pub fn profile(&self) -> Option<&MovementProfile> {
        self.profile.as_ref()
    }
}

impl Pathfinder for SimPathfinder {
    fn set_movement_profile(&mut self, profile: MovementProfile) {
        self.profile = Some(profile);
    }

    fn set_goal(&mut self, goal: BlockPos) -> Result<(), AgentError> {
        let Some(profile) = &self.profile else {
            return Err(AgentError::Rejected("no movement profile installed".to_string()));
        };
        let (min_y, max_y) = profile.height_range;
        if goal.y < min_y || goal.y > max_y {
            let reason = format!("goal height {} is outside the world", goal.y);
            return Err(AgentError::Rejected(reason));
        }
        self.commands.send(SimCommand::Goal(goal)).map_err(|_| AgentError::Closed)
    }
}

/// Server side of one simulated session.
struct Session {
    config: SimConfig,
    target: ConnectionTarget,
    shared: SharedState,
    sink: EventSink,
}

impl Session {
    async fn run(self, refused: bool, mut commands: mpsc::UnboundedReceiver<SimCommand>) {
        if refused {
            let ConnectionTarget { host, port, .. } = &self.target;
            self.emit(AgentEvent::Error { message: format!("connect ECONNREFUSED {host}:{port}") });
            self.finish("socketClosed");
            return;
        }

        if let Some(reason) = self.await_spawn(&mut commands).await {
            self.finish(&reason);
            return;
        }

        let position = self.config.spawn_point;
        lock(&self.shared).position = Some(position);
        self.emit(AgentEvent::Spawn { position });
        self.emit(AgentEvent::Message {
            text: format!("{} joined {}", self.config.username, self.target.host),
        });

        let mut goal: Option<BlockPos> = None;
        let mut ticker = interval(self.config.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    None => break,
                    Some(SimCommand::Chat(message)) => {
                        let username = self.config.username.clone();
                        self.emit(AgentEvent::Chat { username, message });
                    },
                    Some(SimCommand::Look(_)) => {
                        sleep(self.config.look_delay).await;
                        self.emit(AgentEvent::LookSettled { result: Ok(()) });
                    },
                    Some(SimCommand::Goal(block)) => goal = Some(block),
                    Some(SimCommand::Quit(reason)) => {
                        self.finish(&reason);
                        return;
                    },
                },
                _ = ticker.tick() => {
                    if let Some(block) = goal
                        && self.step_toward(block)
                    {
                        goal = None;
                        self.emit(AgentEvent::Message { text: format!("Reached {block}") });
                    }
                },
            }
        }

        lock(&self.shared).ended = true;
    }

    /// Wait out the spawn delay. Returns the quit reason if the session was
    /// closed before spawning.
    async fn await_spawn(
        &self,
        commands: &mut mpsc::UnboundedReceiver<SimCommand>,
    ) -> Option<String> {
        let spawn_at = tokio::time::Instant::now() + self.config.spawn_delay;
        loop {
            tokio::select! {
                () = tokio::time::sleep_until(spawn_at) => return None,
                command = commands.recv() => match command {
                    Some(SimCommand::Quit(reason)) => return Some(reason),
                    None => return Some("handle dropped".to_string()),
                    Some(other) => {
                        tracing::debug!(?other, "ignoring command before spawn");
                    },
                },
            }
        }
    }

    /// Move one step toward `block`. Returns true once standing on it.
    fn step_toward(&self, block: BlockPos) -> bool {
        let destination = block.standing_point();
        let mut state = lock(&self.shared);
        let Some(current) = state.position else {
            return false;
        };

        let step = |from: f64, to: f64| from + (to - from).clamp(-1.0, 1.0);
        let next = Vec3::new(
            step(current.x, destination.x),
            step(current.y, destination.y),
            step(current.z, destination.z),
        );
        state.position = Some(next);
        next.distance(destination) < 1e-9
    }

    fn emit(&self, event: AgentEvent) {
        if lock(&self.shared).detached {
            tracing::trace!(event = event.name(), "dropping event for detached session");
            return;
        }
        self.sink.emit(event);
    }

    fn finish(&self, reason: &str) {
        lock(&self.shared).ended = true;
        self.emit(AgentEvent::End { reason: reason.to_string() });
    }
}

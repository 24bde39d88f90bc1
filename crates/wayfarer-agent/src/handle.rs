//! Agent collaborator traits.

use crate::{AgentError, BlockPos, ConnectionTarget, EventSink, MovementProfile, Vec3, WorldData};

/// Opens agent sessions.
pub trait AgentConnector {
    /// Handle type for an open session.
    type Handle: AgentHandle;

    /// Open a session to `target`.
    ///
    /// Returning a handle only means the session was requested. Success is
    /// signalled later by an [`AgentEvent::Spawn`](crate::AgentEvent::Spawn)
    /// on `sink`; failure by `Error`, `Kicked` or `End`.
    fn open(
        &mut self,
        target: &ConnectionTarget,
        sink: EventSink,
    ) -> Result<Self::Handle, AgentError>;
}

/// Live session with the remote world.
///
/// Dropping the handle releases the session.
pub trait AgentHandle {
    /// Name the agent is known by in the world.
    fn username(&self) -> &str;

    /// Send a chat message.
    fn chat(&mut self, text: &str) -> Result<(), AgentError>;

    /// Start turning to face `target`.
    ///
    /// Completion is reported as an
    /// [`AgentEvent::LookSettled`](crate::AgentEvent::LookSettled).
    fn look_at(&mut self, target: Vec3) -> Result<(), AgentError>;

    /// Current position. `None` before the agent has spawned.
    fn position(&self) -> Option<Vec3>;

    /// Names of every participant the agent currently knows about, itself
    /// included.
    fn participants(&self) -> Vec<String>;

    /// Static data about the connected world.
    fn world_data(&self) -> WorldData;

    /// Movement planner bound to this agent.
    fn pathfinder(&mut self) -> &mut dyn Pathfinder;

    /// Ask the server to end the session.
    fn quit(&mut self, reason: &str) -> Result<(), AgentError>;

    /// Stop delivering events to the sink the session was opened with.
    fn detach(&mut self) -> Result<(), AgentError>;
}

/// Movement planner attached to an agent.
///
/// Movement runs asynchronously and its completion is not reported.
pub trait Pathfinder {
    /// Install the rules used for subsequent goals.
    fn set_movement_profile(&mut self, profile: MovementProfile);

    /// Start moving toward a single block.
    fn set_goal(&mut self, goal: BlockPos) -> Result<(), AgentError>;
}

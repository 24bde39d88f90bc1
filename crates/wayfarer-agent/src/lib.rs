//! Remote agent interface
//!
//! Narrow interface between the connection controller and whatever actually
//! talks to the remote world. The controller only ever sees the traits and
//! event types defined here; the wire protocol, world model and movement
//! planner live behind them.
//!
//! # Architecture
//!
//! An [`AgentConnector`] opens a session for a [`ConnectionTarget`] and returns
//! an [`AgentHandle`]. Lifecycle and content notifications do not arrive as
//! callbacks: the handle pushes [`AgentEvent`]s into the [`EventSink`] it was
//! opened with, stamped with the [`SessionId`] of that attempt, and the owner
//! of the receiving end feeds them to the controller one at a time.
//!
//! # Components
//!
//! - [`AgentConnector`] / [`AgentHandle`] / [`Pathfinder`]: collaborator traits
//! - [`EventBus`] / [`EventSink`]: session-stamped event and fault delivery
//! - [`spawn_supervised`]: background tasks whose panics become [`Fault`]s
//! - [`sim`]: in-process simulated world used when no real server is wired in

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod event;
mod fault;
mod handle;
pub mod sim;
mod target;
mod world;

pub use error::AgentError;
pub use event::{AgentEvent, EventBus, EventSink, EventStreams, SessionEvent, SessionId};
pub use fault::{Fault, FaultOrigin, FaultSink, panic_message, spawn_supervised};
pub use handle::{AgentConnector, AgentHandle, Pathfinder};
pub use target::{ConnectionTarget, DEFAULT_PORT};
pub use world::{BlockPos, MovementProfile, Vec3, WorldData};

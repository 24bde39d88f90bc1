//! Test harness for the Wayfarer controller and runtime.
//!
//! Scripted implementations of the agent and driver traits, so the same
//! controller and runtime that run in the console can be driven
//! deterministically from tests.
//!
//! # Scripted Collaborators
//!
//! [`ScriptedConnector`] hands out [`ScriptedHandle`]s that record every call
//! into the agent and let the test decide what the world does next: refuse a
//! connection, fail a chat, emit any event on any session. [`ScriptedDriver`]
//! feeds queued lines to the runtime and captures everything it prints into a
//! shared [`Transcript`].
//!
//! # Invariant Testing
//!
//! The `invariants` module checks properties that must hold after every
//! step, whatever sequence of operations and events led there. Use
//! [`InvariantRegistry::standard()`] for the controller invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod scripted_agent;
pub mod scripted_driver;

pub use invariants::{
    ControllerSnapshot, HandleMatchesState, Invariant, InvariantRegistry, InvariantResult,
    PendingOpMatchesSession, ReconnectNeedsPolicy, SingleLiveSession, Violation,
};
pub use scripted_agent::{AgentCall, ScriptedConnector, ScriptedHandle, ScriptedPathfinder};
pub use scripted_driver::{ScriptedDriver, Step, Transcript};

//! Application layer for Wayfarer
//!
//! Connection-lifecycle controller and the machinery around it: command
//! parsing and dispatch, fault containment and a generic runtime loop. All
//! decisions are made by pure state machines, so the same code runs against
//! the console and against scripted test drivers.
//!
//! # Components
//!
//! - [`Controller`]: owns at most one agent session; `(state, event) -> actions`
//! - [`dispatch`]: turns an input line into controller calls
//! - [`FaultGuard`]: last line of defense for faults nobody awaited
//! - [`Driver`]: trait for platform-specific console I/O
//! - [`Runtime`]: generic orchestration loop using a Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod command;
mod config;
mod controller;
mod dispatcher;
mod driver;
mod error;
mod event;
mod guard;
mod log;
mod runtime;
mod state;

pub use action::ControllerAction;
pub use command::{Command, CommandId, CommandName, parse_flag, parse_join, parse_vec3};
pub use config::ControllerConfig;
pub use controller::Controller;
pub use dispatcher::{dispatch, help_table};
pub use driver::{Driver, Input};
pub use error::{RuntimeError, UsageError};
pub use event::ControllerEvent;
pub use guard::FaultGuard;
pub use log::{LogLine, Severity};
pub use runtime::{ExitReason, Runtime, RuntimeHandle, Termination};
pub use state::{AttemptOrigin, ConnectionState, PendingOp, ReconnectTicket};
pub use wayfarer_agent::{ConnectionTarget, SessionId};

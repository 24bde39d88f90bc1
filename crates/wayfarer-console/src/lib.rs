//! Interactive console for Wayfarer
//!
//! A thin shell over [`wayfarer_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`wayfarer_app::Runtime`].
//!
//! This crate only handles the terminal, process signals, the panic hook and
//! the startup update advisory.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod advisory;
pub mod console;
pub mod error;
pub mod input;
pub mod panic_hook;
pub mod plain;
pub mod signals;
pub mod style;

pub use advisory::{HttpVersionSource, VersionSource};
pub use console::ConsoleDriver;
pub use error::{AdvisoryError, ConsoleError};
pub use input::{Edit, InputState, KeyInput};
pub use plain::PlainDriver;

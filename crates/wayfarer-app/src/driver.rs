//! Driver trait for abstracting console I/O.
//!
//! The [`Driver`] trait decouples the runtime from the terminal. The console
//! binary implements it over crossterm (or plain stdin when not attached to
//! a terminal); tests implement it over a scripted list of lines. The generic
//! [`crate::Runtime`] handles all orchestration.

use std::future::Future;

use crate::LogLine;

/// One unit of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A complete line.
    Line(String),
    /// The user asked to interrupt (Ctrl-C in raw mode).
    Interrupt,
    /// Input reached end of file.
    Closed,
}

/// Abstracts console I/O for the runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic.
///
/// # Implementations
///
/// - **Console**: crossterm raw mode with a prompt-safe line editor
/// - **Plain**: line-buffered stdin/stdout for pipes and dumb terminals
/// - **Scripted**: queued lines and a captured transcript for tests
pub trait Driver {
    /// Platform-specific error type.
    type Error: std::error::Error + 'static;

    /// Wait for the next input.
    ///
    /// Must be cancel-safe: the runtime races it against events and timers
    /// and drops it when another branch wins. Partial input has to survive
    /// in the driver, not in the future.
    fn next_input(&mut self) -> impl Future<Output = Result<Input, Self::Error>>;

    /// Print a line without disturbing partially typed input.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    fn log(&mut self, line: &LogLine) -> Result<(), Self::Error>;

    /// Clear the visible console.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Restore the terminal and release resources.
    fn shutdown(&mut self);
}

//! Error types for the application layer.

use thiserror::Error;

/// Malformed or missing command arguments.
///
/// Always recoverable: logged as a warning together with the command's usage
/// line, never changes state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UsageError {
    /// A required argument was not given.
    #[error("missing {0}")]
    Missing(&'static str),

    /// Port is not an integer in 0..=65535.
    #[error("invalid port '{0}'")]
    InvalidPort(String),

    /// Coordinate did not parse as a finite number.
    #[error("{axis} must be a finite number, got '{value}'")]
    NotFinite {
        /// Axis name.
        axis: &'static str,
        /// Offending token.
        value: String,
    },

    /// Expected `true` or `false`.
    #[error("expected true or false, got '{0}'")]
    InvalidFlag(String),

    /// An argument that is not accepted.
    #[error("unexpected argument '{0}'")]
    Unexpected(String),
}

/// Runtime failures.
#[derive(Debug, Error)]
pub enum RuntimeError<E: std::error::Error + 'static> {
    /// The driver failed.
    #[error("driver error: {0}")]
    Driver(#[source] E),
}

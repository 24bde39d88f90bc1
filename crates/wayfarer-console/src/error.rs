//! Console error types.

use std::io;

use thiserror::Error;

/// Console driver errors.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Update advisory errors.
#[derive(Debug, Error)]
pub enum AdvisoryError {
    /// The version request failed.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response was not a version tag.
    #[error("unrecognised version '{0}'")]
    Malformed(String),
}

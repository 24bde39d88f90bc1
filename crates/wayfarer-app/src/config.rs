//! Controller configuration.

use std::time::Duration;

use wayfarer_agent::DEFAULT_PORT;

/// Default bound on a connect attempt or an orientation change.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default constant delay before a reconnect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Default chat length limit in UTF-16 code units.
pub const DEFAULT_MAX_CHAT_UNITS: usize = 256;

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Bound on connect attempts and orientation changes.
    pub connect_timeout: Duration,
    /// Delay before each reconnect attempt. Constant, no backoff growth.
    pub reconnect_delay: Duration,
    /// Chat messages are truncated to this many UTF-16 code units.
    pub max_chat_units: usize,
    /// Port used when `join` does not name one.
    pub default_port: u16,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            max_chat_units: DEFAULT_MAX_CHAT_UNITS,
            default_port: DEFAULT_PORT,
        }
    }
}

//! Connection target.

use std::fmt;

/// Port used when a target does not name one.
pub const DEFAULT_PORT: u16 = 25565;

/// Where to connect and which protocol version to speak.
///
/// Immutable once a connect attempt starts. The controller keeps the most
/// recently attempted target for reconnection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionTarget {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Protocol version string. `None` lets the agent negotiate.
    pub version: Option<String>,
}

impl ConnectionTarget {
    /// Target on the default port with a negotiated version.
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into(), port: DEFAULT_PORT, version: None }
    }

    /// Replace the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Pin the protocol version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)?;
        if let Some(version) = &self.version {
            write!(f, " (version {version})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_standard_port() {
        let target = ConnectionTarget::new("play.example.net");
        assert_eq!(target.port, DEFAULT_PORT);
        assert_eq!(target.version, None);
    }

    #[test]
    fn display_includes_version_when_pinned() {
        let target = ConnectionTarget::new("localhost").with_port(25566).with_version("1.20.1");
        assert_eq!(target.to_string(), "localhost:25566 (version 1.20.1)");
        assert_eq!(ConnectionTarget::new("localhost").to_string(), "localhost:25565");
    }
}

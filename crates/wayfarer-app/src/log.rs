//! User-facing log lines.

use std::fmt;

/// Severity tag of a console line. Styling is keyed purely by this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Neutral information.
    Info,
    /// Recoverable problem, usually a usage error.
    Warning,
    /// Failed operation.
    Error,
    /// Completed operation.
    Success,
    /// Participant chat.
    Chat,
    /// World or server notification.
    Event,
}

impl Severity {
    /// Every severity, in display order.
    pub const ALL: [Self; 6] =
        [Self::Info, Self::Warning, Self::Error, Self::Success, Self::Chat, Self::Event];

    /// Lower-case tag name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Success => "success",
            Self::Chat => "chat",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of console output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Severity tag.
    pub severity: Severity,
    /// Message text.
    pub message: String,
}

impl LogLine {
    /// Create a line with the given severity.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self { severity, message: message.into() }
    }

    /// `info` line.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// `warning` line.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// `error` line.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// `success` line.
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    /// `chat` line.
    pub fn chat(message: impl Into<String>) -> Self {
        Self::new(Severity::Chat, message)
    }

    /// `event` line.
    pub fn event(message: impl Into<String>) -> Self {
        Self::new(Severity::Event, message)
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

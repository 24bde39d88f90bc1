//! Command parsing.
//!
//! A line of input is split on whitespace. The first token selects a
//! [`CommandName`] case-insensitively; everything after it is passed to the
//! handler untouched. Argument shaping is per command and lives in the
//! `parse_*` helpers so the handlers stay one-liners.

use std::fmt;

use wayfarer_agent::{ConnectionTarget, Vec3};

use crate::UsageError;

/// The closed set of console commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    /// Connect to a server.
    Join,
    /// Disconnect.
    Leave,
    /// Send chat.
    Say,
    /// Report position or participants.
    Query,
    /// Turn to face a point.
    LookAt,
    /// Walk to a block.
    Goto,
    /// Toggle the reconnect policy.
    AutoReconnect,
    /// Print the command table.
    Help,
    /// Disconnect and end the process.
    Exit,
    /// Clear the console.
    Clear,
}

impl CommandName {
    /// Every command, in help-table order.
    pub const ALL: [Self; 10] = [
        Self::Join,
        Self::Leave,
        Self::Say,
        Self::Query,
        Self::LookAt,
        Self::Goto,
        Self::AutoReconnect,
        Self::Help,
        Self::Exit,
        Self::Clear,
    ];

    /// Name as typed.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Leave => "leave",
            Self::Say => "say",
            Self::Query => "query",
            Self::LookAt => "lookat",
            Self::Goto => "goto",
            Self::AutoReconnect => "autoreconnect",
            Self::Help => "help",
            Self::Exit => "exit",
            Self::Clear => "clear",
        }
    }

    /// Case-insensitive lookup.
    pub fn lookup(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|name| name.as_str().eq_ignore_ascii_case(token))
    }

    /// Usage line shown in help and on argument errors.
    pub fn usage(&self) -> &'static str {
        match self {
            Self::Join => "join <host> [port|version] [version]",
            Self::Leave => "leave",
            Self::Say => "say <message...>",
            Self::Query => "query <position|players>",
            Self::LookAt => "lookat <x> <y> <z>",
            Self::Goto => "goto <x> <y> <z>",
            Self::AutoReconnect => "autoreconnect <true|false>",
            Self::Help => "help",
            Self::Exit => "exit",
            Self::Clear => "clear",
        }
    }

    /// One-line description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Join => "Connect to a server",
            Self::Leave => "Disconnect from the server",
            Self::Say => "Send a chat message",
            Self::Query => "Report position or online players",
            Self::LookAt => "Turn to face a point",
            Self::Goto => "Walk to a block",
            Self::AutoReconnect => "Reconnect automatically after a disconnect",
            Self::Help => "Show this table",
            Self::Exit => "Disconnect and quit",
            Self::Clear => "Clear the console",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved command name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandId {
    /// One of the known commands.
    Known(CommandName),
    /// Anything else, as typed.
    Unknown(String),
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Resolved name.
    pub name: CommandId,
    /// Remaining tokens.
    pub args: Vec<String>,
}

impl Command {
    /// Parse a line. Returns `None` for blank lines.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let first = tokens.next()?;
        let name = match CommandName::lookup(first) {
            Some(name) => CommandId::Known(name),
            None => CommandId::Unknown(first.to_string()),
        };
        Some(Self { name, args: tokens.map(str::to_string).collect() })
    }
}

/// Shape `join` arguments into a target.
///
/// The second token is a protocol version if it contains a `.`, otherwise a
/// port. A third token always sets the version. Tokens past the third are
/// ignored.
pub fn parse_join(args: &[String], default_port: u16) -> Result<ConnectionTarget, UsageError> {
    let host = args.first().ok_or(UsageError::Missing("host"))?;
    let mut target = ConnectionTarget::new(host.as_str()).with_port(default_port);

    if let Some(second) = args.get(1) {
        if second.contains('.') {
            target = target.with_version(second.as_str());
        } else {
            let port = second.parse().map_err(|_| UsageError::InvalidPort(second.clone()))?;
            target = target.with_port(port);
        }
    }

    if let Some(version) = args.get(2) {
        target = target.with_version(version.as_str());
    }

    Ok(target)
}

/// Parse exactly three finite coordinates.
pub fn parse_vec3(args: &[String]) -> Result<Vec3, UsageError> {
    let axis = |index: usize, name: &'static str| -> Result<f64, UsageError> {
        let token = args.get(index).ok_or(UsageError::Missing(name))?;
        match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(UsageError::NotFinite { axis: name, value: token.clone() }),
        }
    };

    let point = Vec3::new(axis(0, "x")?, axis(1, "y")?, axis(2, "z")?);
    if let Some(extra) = args.get(3) {
        return Err(UsageError::Unexpected(extra.clone()));
    }
    Ok(point)
}

/// Parse a `true`/`false` argument, case-insensitively.
pub fn parse_flag(args: &[String]) -> Result<bool, UsageError> {
    let token = args.first().ok_or(UsageError::Missing("true|false"))?;
    if token.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if token.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(UsageError::InvalidFlag(token.clone()))
    }
}

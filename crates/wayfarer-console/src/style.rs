//! Severity styling.
//!
//! Colors are keyed purely by [`Severity`]; the message text is printed as
//! given.

use crossterm::style::{Color, Stylize};
use wayfarer_app::{LogLine, Severity};

/// Foreground color for a severity tag.
pub fn color(severity: Severity) -> Color {
    match severity {
        Severity::Info => Color::Cyan,
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
        Severity::Success => Color::Green,
        Severity::Chat => Color::White,
        Severity::Event => Color::Magenta,
    }
}

/// Render a line with a colored tag for the raw-mode console.
pub fn styled(line: &LogLine) -> String {
    let tag = format!("[{}]", line.severity.as_str()).with(color(line.severity)).bold();
    format!("{tag} {}", line.message)
}

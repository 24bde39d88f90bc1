//! Line-buffered driver for pipes and dumb terminals.

use std::io::{Stdout, Write, stdout};

use crossterm::{
    cursor::MoveTo,
    queue,
    terminal::{Clear, ClearType},
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin, stdin};
use wayfarer_app::{Driver, Input, LogLine};

use crate::ConsoleError;

/// Reads whole lines from stdin and prints `[tag] message` lines to stdout.
///
/// There is no prompt to protect, so printing is a plain write.
pub struct PlainDriver {
    lines: Lines<BufReader<Stdin>>,
    out: Stdout,
}

impl PlainDriver {
    /// Create a driver over the process's stdin and stdout.
    pub fn new() -> Self {
        Self { lines: BufReader::new(stdin()).lines(), out: stdout() }
    }
}

impl Default for PlainDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for PlainDriver {
    type Error = ConsoleError;

    async fn next_input(&mut self) -> Result<Input, Self::Error> {
        // `next_line` is cancel-safe.
        match self.lines.next_line().await? {
            Some(line) => Ok(Input::Line(line)),
            None => Ok(Input::Closed),
        }
    }

    fn log(&mut self, line: &LogLine) -> Result<(), Self::Error> {
        let mut out = self.out.lock();
        writeln!(out, "{line}")?;
        out.flush()?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        self.out.flush()?;
        Ok(())
    }

    fn shutdown(&mut self) {
        let _ = self.out.flush();
    }
}

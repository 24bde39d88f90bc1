//! Raw-mode console driver.
//!
//! Implements the [`Driver`] trait over crossterm. The terminal stays in raw
//! mode so log lines can be printed above the prompt at any time: each line
//! clears the prompt row, prints itself, then redraws the prompt with the
//! partially typed input and cursor exactly where they were.

use std::io::{self, Stdout, Write, stdout};

use crossterm::{
    cursor::{MoveTo, MoveToColumn},
    event::{Event, EventStream, KeyEventKind},
    queue,
    style::Print,
    terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use wayfarer_app::{Driver, Input, LogLine};

use crate::{ConsoleError, Edit, InputState, KeyInput, style};

/// Prompt drawn in front of the input line.
pub const PROMPT: &str = "> ";

/// Console driver implementing the [`Driver`] trait.
pub struct ConsoleDriver {
    events: EventStream,
    input: InputState,
    out: Stdout,
    raw: bool,
}

impl ConsoleDriver {
    /// Enter raw mode and draw the prompt.
    pub fn new() -> Result<Self, ConsoleError> {
        enable_raw_mode()?;

        let mut driver =
            Self { events: EventStream::new(), input: InputState::new(), out: stdout(), raw: true };
        driver.redraw()?;
        Ok(driver)
    }

    /// Queue the prompt row: prompt, partial input, cursor.
    fn queue_prompt(&mut self) -> io::Result<()> {
        let column = PROMPT.chars().count() + self.input.cursor();
        queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(PROMPT),
            Print(self.input.buffer()),
            MoveToColumn(u16::try_from(column).unwrap_or(u16::MAX)),
        )
    }

    fn redraw(&mut self) -> io::Result<()> {
        self.queue_prompt()?;
        self.out.flush()
    }

    /// Leave the submitted line on screen and start a fresh prompt.
    fn echo(&mut self, line: &str) -> io::Result<()> {
        queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(PROMPT),
            Print(line),
            Print("\r\n"),
        )?;
        self.redraw()
    }

    fn restore(&mut self) {
        if !self.raw {
            return;
        }
        self.raw = false;

        let _ = queue!(self.out, MoveToColumn(0), Clear(ClearType::CurrentLine));
        let _ = self.out.flush();
        if let Err(e) = disable_raw_mode() {
            tracing::warn!(error = %e, "failed to leave raw mode");
        }
    }
}

impl Driver for ConsoleDriver {
    type Error = ConsoleError;

    async fn next_input(&mut self) -> Result<Input, Self::Error> {
        // Only `events.next()` is awaited; every edit completes before the
        // next await, so dropping this future never loses a key.
        while let Some(event) = self.events.next().await {
            let key = match event? {
                Event::Key(key) if key.kind == KeyEventKind::Press => key,
                Event::Resize(..) => {
                    self.redraw()?;
                    continue;
                },
                _ => continue,
            };
            let Some(key) = KeyInput::from_event(key) else {
                continue;
            };

            match self.input.handle_key(key) {
                Edit::Unchanged => {},
                Edit::Changed => self.redraw()?,
                Edit::Submit(line) => {
                    self.echo(&line)?;
                    return Ok(Input::Line(line));
                },
                Edit::Interrupt => return Ok(Input::Interrupt),
                Edit::EndOfInput => return Ok(Input::Closed),
            }
        }
        Ok(Input::Closed)
    }

    fn log(&mut self, line: &LogLine) -> Result<(), Self::Error> {
        queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(style::styled(line)),
            Print("\r\n"),
        )?;
        self.redraw()?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        queue!(self.out, Clear(ClearType::All), Clear(ClearType::Purge), MoveTo(0, 0))?;
        self.redraw()?;
        Ok(())
    }

    fn shutdown(&mut self) {
        self.restore();
    }
}

impl Drop for ConsoleDriver {
    fn drop(&mut self) {
        self.restore();
    }
}

//! Scripted console driver.
//!
//! Plays back a list of [`Step`]s as user input and records every printed
//! line into a [`Transcript`] shared with the test. Sleeps use tokio time,
//! so under a paused clock a script spanning minutes runs instantly.

use std::{
    collections::VecDeque,
    convert::Infallible,
    future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::time::Instant;
use wayfarer_app::{Driver, Input, LogLine, Severity};

/// One scripted input step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Deliver a line.
    Line(String),
    /// Deliver nothing for a while.
    Sleep(Duration),
    /// Deliver Ctrl-C.
    Interrupt,
    /// Deliver end of input.
    Close,
}

impl Step {
    /// Shorthand for [`Step::Line`].
    pub fn line(line: impl Into<String>) -> Self {
        Self::Line(line.into())
    }
}

#[derive(Debug, Default)]
struct Recorded {
    lines: Vec<LogLine>,
    clears: usize,
    shut_down: bool,
}

/// Everything a [`ScriptedDriver`] printed. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    recorded: Arc<Mutex<Recorded>>,
}

impl Transcript {
    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every printed line, in order.
    pub fn lines(&self) -> Vec<LogLine> {
        self.lock().lines.clone()
    }

    /// Printed lines of one severity.
    pub fn with_severity(&self, severity: Severity) -> Vec<String> {
        self.lock()
            .lines
            .iter()
            .filter(|line| line.severity == severity)
            .map(|line| line.message.clone())
            .collect()
    }

    /// Whether any printed line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lock().lines.iter().any(|line| line.message.contains(needle))
    }

    /// Number of screen clears.
    pub fn clears(&self) -> usize {
        self.lock().clears
    }

    /// Whether the driver was shut down.
    pub fn shut_down(&self) -> bool {
        self.lock().shut_down
    }
}

/// Driver that plays back scripted input.
///
/// Once the script runs out the driver waits forever, so a test ends with an
/// `exit` line, [`Step::Interrupt`] or [`Step::Close`].
#[derive(Debug, Default)]
pub struct ScriptedDriver {
    steps: VecDeque<Step>,
    /// End of the sleep in progress. Kept here so a cancelled `next_input`
    /// resumes the same sleep.
    wake_at: Option<Instant>,
    transcript: Transcript,
}

impl ScriptedDriver {
    /// Create a driver that plays `steps`.
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self { steps: steps.into_iter().collect(), ..Self::default() }
    }

    /// Create a driver that types each of `lines` in order.
    pub fn lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(lines.into_iter().map(Step::line))
    }

    /// Shared transcript of everything printed.
    pub fn transcript(&self) -> Transcript {
        self.transcript.clone()
    }
}

impl Driver for ScriptedDriver {
    type Error = Infallible;

    async fn next_input(&mut self) -> Result<Input, Self::Error> {
        loop {
            if let Some(at) = self.wake_at {
                tokio::time::sleep_until(at).await;
                self.wake_at = None;
            }

            match self.steps.pop_front() {
                Some(Step::Line(line)) => return Ok(Input::Line(line)),
                Some(Step::Sleep(duration)) => self.wake_at = Some(Instant::now() + duration),
                Some(Step::Interrupt) => return Ok(Input::Interrupt),
                Some(Step::Close) => return Ok(Input::Closed),
                None => future::pending::<()>().await,
            }
        }
    }

    fn log(&mut self, line: &LogLine) -> Result<(), Self::Error> {
        self.transcript.lock().lines.push(line.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.transcript.lock().clears += 1;
        Ok(())
    }

    fn shutdown(&mut self) {
        self.transcript.lock().shut_down = true;
    }
}

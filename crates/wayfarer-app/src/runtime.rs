//! Generic runtime for console orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`Controller`]: connection-lifecycle state machine
//! - [`FaultGuard`]: recovery from uncontained faults
//! - [`Driver`]: platform-specific console I/O
//!
//! Everything runs on one task. Input lines are queued and dispatched one at
//! a time, and never while a connect or look started by a command is
//! outstanding. Agent events, timers, faults and termination requests keep
//! flowing while it waits. End of input stops reading; the run ends once the
//! queued lines have been dispatched.

use std::{
    collections::VecDeque,
    future,
    panic::{self, AssertUnwindSafe},
};

use futures::FutureExt;
use tokio::{sync::mpsc, time::Instant};
use wayfarer_agent::{
    AgentConnector, EventBus, EventStreams, Fault, FaultOrigin, FaultSink, SessionEvent,
    panic_message,
};

use crate::{
    Controller, ControllerAction, ControllerConfig, ControllerEvent, Driver, FaultGuard, Input,
    LogLine, PendingOp, ReconnectTicket, RuntimeError, Severity, dispatch,
};

/// Target every user-facing line is mirrored to.
const CONSOLE_TARGET: &str = "wayfarer::console";

/// External request to end the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Interrupt signal.
    Interrupt,
    /// Terminate signal.
    Terminate,
}

/// Why the runtime stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The `exit` command.
    Command,
    /// Interrupt signal or Ctrl-C.
    Interrupted,
    /// Terminate signal.
    Terminated,
    /// Input reached end of file.
    InputClosed,
}

/// Cloneable handle for feeding the runtime from outside its task.
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    notices: mpsc::UnboundedSender<LogLine>,
    terminations: mpsc::UnboundedSender<Termination>,
    faults: FaultSink,
}

impl RuntimeHandle {
    /// Print a line from background work (advisories, signal notices).
    pub fn notify(&self, line: LogLine) {
        let _ = self.notices.send(line);
    }

    /// Ask the runtime to disconnect and stop.
    pub fn terminate(&self, termination: Termination) {
        let _ = self.terminations.send(termination);
    }

    /// Fault channel read by the fault guard.
    pub fn faults(&self) -> &FaultSink {
        &self.faults
    }
}

/// Armed timers. At most one deadline and one reconnect at a time.
#[derive(Debug, Default)]
struct Timers {
    deadline: Option<(Instant, PendingOp)>,
    reconnect: Option<(Instant, ReconnectTicket)>,
}

impl Timers {
    fn is_armed(&self) -> bool {
        self.deadline.is_some() || self.reconnect.is_some()
    }

    /// Sleep until the earliest armed timer and return its event.
    async fn next_due(&self) -> ControllerEvent {
        let deadline = self.deadline.map(|(at, op)| (at, ControllerEvent::Deadline(op)));
        let reconnect =
            self.reconnect.map(|(at, ticket)| (at, ControllerEvent::ReconnectDue(ticket)));

        let next = match (deadline, reconnect) {
            (Some(a), Some(b)) => Some(if b.0 < a.0 { b } else { a }),
            (a, b) => a.or(b),
        };
        match next {
            Some((at, event)) => {
                tokio::time::sleep_until(at).await;
                event
            },
            None => future::pending().await,
        }
    }

    fn disarm(&mut self, event: &ControllerEvent) {
        match event {
            ControllerEvent::Deadline(_) => self.deadline = None,
            ControllerEvent::ReconnectDue(_) => self.reconnect = None,
            ControllerEvent::Agent { .. } => {},
        }
    }
}

/// What woke the loop.
enum Wake {
    Terminate(Termination),
    Input(Input),
    Fault(Fault),
    Event(ControllerEvent),
    Timer(ControllerEvent),
    Notice(LogLine),
}

/// Generic runtime that orchestrates Controller, FaultGuard and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific console driver
/// - `C`: Agent connector the controller opens sessions with
pub struct Runtime<D, C>
where
    D: Driver,
    C: AgentConnector,
{
    driver: D,
    controller: Controller<C>,
    guard: FaultGuard,
    streams: EventStreams,
    notices: mpsc::UnboundedReceiver<LogLine>,
    terminations: mpsc::UnboundedReceiver<Termination>,
    handle: RuntimeHandle,
    queue: VecDeque<String>,
    /// Driver reported end of input.
    input_closed: bool,
    timers: Timers,
}

impl<D, C> Runtime<D, C>
where
    D: Driver,
    C: AgentConnector,
{
    /// Create a runtime with a fresh, disconnected controller.
    pub fn new(driver: D, connector: C, config: ControllerConfig) -> Self {
        let (bus, streams) = EventBus::channel();
        let (notices_tx, notices) = mpsc::unbounded_channel();
        let (terminations_tx, terminations) = mpsc::unbounded_channel();
        let handle = RuntimeHandle {
            notices: notices_tx,
            terminations: terminations_tx,
            faults: bus.faults().clone(),
        };

        Self {
            driver,
            controller: Controller::new(connector, bus, config),
            guard: FaultGuard::new(),
            streams,
            notices,
            terminations,
            handle,
            queue: VecDeque::new(),
            input_closed: false,
            timers: Timers::default(),
        }
    }

    /// Handle for background work that needs to reach the runtime.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Queue a line as if the user had typed it.
    pub fn submit(&mut self, line: impl Into<String>) {
        self.queue.push_back(line.into());
    }

    /// Get a reference to the Controller
    pub fn controller(&self) -> &Controller<C> {
        &self.controller
    }

    /// Get a mutable reference to the Controller
    pub fn controller_mut(&mut self) -> &mut Controller<C> {
        &mut self.controller
    }

    /// Run until `exit`, a termination request or end of input.
    ///
    /// The controller is shut down and the driver released on every path.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<ExitReason, RuntimeError<D::Error>> {
        let outcome = self.drive().await;

        for action in self.controller.shutdown() {
            if let ControllerAction::Log(line) = action {
                mirror(&line);
                if let Err(e) = self.driver.log(&line) {
                    tracing::debug!(error = %e, "failed to print shutdown line");
                }
            }
        }
        self.driver.shutdown();

        if let Ok(reason) = &outcome {
            tracing::info!(?reason, "runtime stopped");
        }
        outcome
    }

    async fn drive(&mut self) -> Result<ExitReason, RuntimeError<D::Error>> {
        loop {
            if let Some(reason) = self.drain_queue()? {
                return Ok(reason);
            }
            if self.input_closed && self.queue.is_empty() && !self.controller.input_blocked() {
                return Ok(ExitReason::InputClosed);
            }

            match AssertUnwindSafe(self.step()).catch_unwind().await {
                Ok(Ok(Some(reason))) => return Ok(reason),
                Ok(Ok(None)) => {},
                Ok(Err(e)) => return Err(e),
                Err(payload) => {
                    let fault = Fault::new(FaultOrigin::Runtime, panic_message(&*payload));
                    if let Some(reason) = self.contain(&fault)? {
                        return Ok(reason);
                    }
                },
            }
        }
    }

    /// Dispatch queued lines until one leaves input blocked.
    fn drain_queue(&mut self) -> Result<Option<ExitReason>, RuntimeError<D::Error>> {
        while !self.controller.input_blocked()
            && let Some(line) = self.queue.pop_front()
        {
            let actions = dispatch(&mut self.controller, &line);
            if let Some(reason) = self.execute(actions)? {
                return Ok(Some(reason));
            }
        }
        Ok(None)
    }

    /// Wait for one wake-up and process it.
    async fn step(&mut self) -> Result<Option<ExitReason>, RuntimeError<D::Error>> {
        let wake = tokio::select! {
            biased;

            Some(termination) = self.terminations.recv() => Wake::Terminate(termination),
            Some(fault) = self.streams.faults.recv() => Wake::Fault(fault),
            Some(SessionEvent { session, event }) = self.streams.events.recv() => {
                Wake::Event(ControllerEvent::Agent { session, event })
            },
            event = self.timers.next_due(), if self.timers.is_armed() => Wake::Timer(event),
            Some(line) = self.notices.recv() => Wake::Notice(line),
            input = self.driver.next_input(), if !self.input_closed => {
                Wake::Input(input.map_err(RuntimeError::Driver)?)
            },
        };

        match wake {
            Wake::Terminate(termination) => {
                tracing::info!(?termination, "termination requested");
                let reason = match termination {
                    Termination::Interrupt => ExitReason::Interrupted,
                    Termination::Terminate => ExitReason::Terminated,
                };
                Ok(Some(reason))
            },
            Wake::Input(Input::Line(line)) => {
                self.queue.push_back(line);
                Ok(None)
            },
            Wake::Input(Input::Interrupt) => Ok(Some(ExitReason::Interrupted)),
            Wake::Input(Input::Closed) => {
                tracing::debug!(queued = self.queue.len(), "input closed");
                self.input_closed = true;
                Ok(None)
            },
            Wake::Fault(fault) => self.contain(&fault),
            Wake::Event(event) => self.apply_event(event),
            Wake::Timer(event) => {
                self.timers.disarm(&event);
                self.apply_event(event)
            },
            Wake::Notice(line) => self.execute(vec![ControllerAction::Log(line)]),
        }
    }

    /// Feed one event to the controller. A panic is handed to the guard.
    fn apply_event(
        &mut self,
        event: ControllerEvent,
    ) -> Result<Option<ExitReason>, RuntimeError<D::Error>> {
        let name = event.name();
        let controller = &mut self.controller;
        match panic::catch_unwind(AssertUnwindSafe(|| controller.handle(event))) {
            Ok(actions) => self.execute(actions),
            Err(payload) => {
                let fault = Fault::new(FaultOrigin::Event(name), panic_message(&*payload));
                self.contain(&fault)
            },
        }
    }

    /// Run fault recovery. A panic during recovery is logged and dropped.
    fn contain(&mut self, fault: &Fault) -> Result<Option<ExitReason>, RuntimeError<D::Error>> {
        let (guard, controller) = (&mut self.guard, &mut self.controller);
        let recovered = panic::catch_unwind(AssertUnwindSafe(|| guard.recover(controller, fault)));
        let actions = match recovered {
            Ok(actions) => actions,
            Err(payload) => {
                let reason = panic_message(&*payload);
                tracing::error!(%reason, "fault recovery panicked");
                vec![LogLine::error(format!("Fault recovery failed: {reason}")).into()]
            },
        };
        self.execute(actions)
    }

    /// Execute controller actions. Returns the exit reason if one of them
    /// ends the process.
    fn execute(
        &mut self,
        actions: Vec<ControllerAction>,
    ) -> Result<Option<ExitReason>, RuntimeError<D::Error>> {
        for action in actions {
            match action {
                ControllerAction::Log(line) => {
                    mirror(&line);
                    self.driver.log(&line).map_err(RuntimeError::Driver)?;
                },
                ControllerAction::Await { op, timeout } => {
                    self.timers.deadline = Some((Instant::now() + timeout, op));
                },
                ControllerAction::Settled { op } => {
                    if self.timers.deadline.is_some_and(|(_, armed)| armed == op) {
                        self.timers.deadline = None;
                    }
                },
                ControllerAction::ScheduleReconnect { ticket, target, after } => {
                    tracing::debug!(?ticket, %target, ?after, "reconnect scheduled");
                    self.timers.reconnect = Some((Instant::now() + after, ticket));
                },
                ControllerAction::CancelReconnect { ticket } => {
                    if self.timers.reconnect.is_some_and(|(_, armed)| armed == ticket) {
                        self.timers.reconnect = None;
                    }
                },
                ControllerAction::ClearScreen => {
                    self.driver.clear().map_err(RuntimeError::Driver)?;
                },
                ControllerAction::Exit => return Ok(Some(ExitReason::Command)),
            }
        }
        Ok(None)
    }
}

/// Mirror a console line into the diagnostic log.
fn mirror(line: &LogLine) {
    match line.severity {
        Severity::Error => tracing::error!(target: CONSOLE_TARGET, "{}", line.message),
        Severity::Warning => tracing::warn!(target: CONSOLE_TARGET, "{}", line.message),
        severity => tracing::info!(target: CONSOLE_TARGET, %severity, "{}", line.message),
    }
}

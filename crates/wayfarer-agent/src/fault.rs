//! Fault reporting for work nobody awaits.
//!
//! Background tasks (agent sessions, the update advisory, signal listeners)
//! run detached from the control flow. A panic inside one of them would
//! otherwise vanish into a dropped `JoinHandle`; [`spawn_supervised`] catches
//! it and reports a [`Fault`] so the fault guard can log it and recover.

use std::{any::Any, fmt, future::Future, panic::AssertUnwindSafe};

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

/// Channel faults are reported on.
pub type FaultSink = mpsc::UnboundedSender<Fault>;

/// Where a fault escaped from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultOrigin {
    /// A supervised background task.
    Task(String),
    /// Processing of an agent or timer event.
    Event(&'static str),
    /// A command handler.
    Command(String),
    /// The runtime loop itself.
    Runtime,
    /// A thread other than the runtime thread.
    Thread(String),
}

impl fmt::Display for FaultOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task(name) => write!(f, "task '{name}'"),
            Self::Event(name) => write!(f, "{name} event"),
            Self::Command(name) => write!(f, "command '{name}'"),
            Self::Runtime => write!(f, "runtime loop"),
            Self::Thread(name) => write!(f, "thread '{name}'"),
        }
    }
}

/// An uncontained fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// Where it escaped from.
    pub origin: FaultOrigin,
    /// Human-readable description.
    pub message: String,
}

impl Fault {
    /// Create a fault.
    pub fn new(origin: FaultOrigin, message: impl Into<String>) -> Self {
        Self { origin, message: message.into() }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.origin, self.message)
    }
}

/// Best-effort description of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Spawn a task whose panic is reported on `faults` instead of being lost.
pub fn spawn_supervised<F>(name: impl Into<String>, faults: FaultSink, future: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let name = name.into();
    tokio::spawn(async move {
        if let Err(payload) = AssertUnwindSafe(future).catch_unwind().await {
            let message = panic_message(&*payload);
            tracing::warn!(task = %name, %message, "supervised task panicked");
            let _ = faults.send(Fault::new(FaultOrigin::Task(name), message));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[allow(clippy::panic)]
    async fn panicking_task_reports_fault() {
        let (faults, mut rx) = mpsc::unbounded_channel();

        let handle = spawn_supervised("exploder", faults, async {
            panic!("boom");
        });
        assert!(handle.await.is_ok());

        let fault = rx.recv().await;
        assert_eq!(fault, Some(Fault::new(FaultOrigin::Task("exploder".into()), "boom")));
    }

    #[tokio::test]
    async fn clean_task_reports_nothing() {
        let (faults, mut rx) = mpsc::unbounded_channel();

        let handle = spawn_supervised("quiet", faults, async {});
        assert!(handle.await.is_ok());

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn panic_message_reads_formatted_payloads() {
        let payload: Box<dyn Any + Send> = Box::new(format!("value {}", 3));
        assert_eq!(panic_message(&*payload), "value 3");

        let payload: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(&*payload), "unknown panic");
    }
}

//! Process-wide panic hook.
//!
//! The default hook writes a report to stderr, which would land in the middle
//! of the prompt. This hook reports to `tracing` instead. Panics on the runtime
//! thread are caught where they happen and classified there; a panic on any
//! other thread has no catch site, so it is forwarded to the fault guard.

use std::{
    panic,
    thread::{self, ThreadId},
};

use wayfarer_agent::{Fault, FaultOrigin, FaultSink, panic_message};

/// Replace the default panic hook. Call from the runtime thread.
pub fn install(faults: FaultSink) {
    let runtime_thread = thread::current().id();

    panic::set_hook(Box::new(move |info| {
        let message = panic_message(info.payload());
        let location = info.location().map(ToString::to_string).unwrap_or_default();
        tracing::error!(%message, %location, "panic");

        if let Some(origin) = foreign_origin(runtime_thread) {
            let _ = faults.send(Fault::new(origin, message));
        }
    }));
}

/// Origin of a panic on the current thread, unless it is the runtime thread.
fn foreign_origin(runtime_thread: ThreadId) -> Option<FaultOrigin> {
    let current = thread::current();
    if current.id() == runtime_thread {
        return None;
    }
    let name = current.name().map_or_else(|| format!("{:?}", current.id()), str::to_string);
    Some(FaultOrigin::Thread(name))
}

//! Process signal forwarding.
//!
//! Signals never touch the controller directly. They are turned into
//! [`Termination`] requests so the runtime disconnects on its own task and
//! then stops.

use wayfarer_app::{RuntimeHandle, Termination};

/// Forward SIGINT and SIGTERM to the runtime until the process exits.
#[cfg(unix)]
pub async fn forward(handle: RuntimeHandle) {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut interrupt, mut terminate) =
        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(interrupt), Ok(terminate)) => (interrupt, terminate),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "cannot install signal handlers");
                return;
            },
        };

    loop {
        let termination = tokio::select! {
            Some(()) = interrupt.recv() => Termination::Interrupt,
            Some(()) = terminate.recv() => Termination::Terminate,
            else => return,
        };
        tracing::info!(?termination, "signal received");
        handle.terminate(termination);
    }
}

/// Forward Ctrl-C to the runtime until the process exits.
#[cfg(not(unix))]
pub async fn forward(handle: RuntimeHandle) {
    loop {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for ctrl-c");
            return;
        }
        tracing::info!("ctrl-c received");
        handle.terminate(Termination::Interrupt);
    }
}

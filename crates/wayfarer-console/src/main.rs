//! Wayfarer console binary.
//!
//! # Usage
//!
//! ```bash
//! # Interactive console against the simulated world
//! wayfarer
//!
//! # Join on startup and keep reconnecting
//! wayfarer --join "localhost 25565" --auto-reconnect
//!
//! # Piped commands, diagnostics to a file
//! wayfarer --plain --log-file wayfarer.log < commands.txt
//! ```

use std::{
    fs::File,
    io::{IsTerminal, stdin, stdout},
    path::PathBuf,
    process,
    sync::Mutex,
    time::Duration,
};

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use wayfarer_agent::{
    sim::{SimConfig, SimConnector},
    spawn_supervised,
};
use wayfarer_app::{ControllerConfig, Driver, ExitReason, LogLine, Runtime, RuntimeError};
use wayfarer_console::{
    ConsoleDriver, HttpVersionSource, PlainDriver, advisory, panic_hook, signals,
};

/// Wayfarer interactive console
#[derive(Parser, Debug)]
#[command(name = "wayfarer")]
#[command(about = "Interactive console for driving a Wayfarer agent")]
#[command(version)]
struct Args {
    /// Read whole lines from stdin and print without styling
    ///
    /// Implied when stdin or stdout is not a terminal.
    #[arg(long)]
    plain: bool,

    /// Reconnect whenever the session drops
    #[arg(long)]
    auto_reconnect: bool,

    /// Seconds to wait for a connect attempt or an orientation change
    #[arg(long, default_value_t = 30)]
    connect_timeout: u64,

    /// Seconds between reconnect attempts
    #[arg(long, default_value_t = 5)]
    reconnect_delay: u64,

    /// Name the agent joins with
    #[arg(long, default_value = "Wayfarer")]
    username: String,

    /// Write diagnostics to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Diagnostic log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Skip the startup update check
    #[arg(long)]
    no_update_check: bool,

    /// Where the latest version tag is published
    #[arg(long, default_value = advisory::DEFAULT_VERSION_URL)]
    version_url: String,

    /// Arguments of a `join` issued before the first prompt, e.g. "localhost 25565"
    #[arg(long, value_name = "ARGS")]
    join: Option<String>,
}

impl Args {
    fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout),
            reconnect_delay: Duration::from_secs(self.reconnect_delay),
            ..ControllerConfig::default()
        }
    }

    fn sim_config(&self) -> SimConfig {
        SimConfig { username: self.username.clone(), ..SimConfig::default() }
    }
}

/// Send diagnostics to the log file, if one was given.
///
/// Nothing is installed otherwise: stderr shares the terminal with the prompt.
fn init_tracing(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };
    let file = File::options().create(true).append(true).open(path)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(filter)
        .init();
    Ok(())
}

async fn serve<D: Driver>(driver: D, args: &Args) -> Result<ExitReason, RuntimeError<D::Error>> {
    let connector = SimConnector::new(args.sim_config());
    let mut runtime = Runtime::new(driver, connector, args.controller_config());
    let handle = runtime.handle();
    let faults = handle.faults().clone();

    panic_hook::install(faults.clone());
    let _signals = spawn_supervised("signals", faults.clone(), signals::forward(handle.clone()));

    if !args.no_update_check {
        match HttpVersionSource::new(&args.version_url, advisory::FETCH_TIMEOUT) {
            Ok(source) => {
                let local = env!("CARGO_PKG_VERSION").to_string();
                let task = advisory::run(source, local, handle);
                let _advisory = spawn_supervised("update advisory", faults, task);
            },
            Err(e) => {
                handle.notify(LogLine::warning(format!("Could not check for updates: {e}")));
            },
        }
    }

    if args.auto_reconnect {
        runtime.submit("autoreconnect true");
    }
    if let Some(join) = &args.join {
        runtime.submit(format!("join {join}"));
    }

    runtime.run().await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(&args)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "wayfarer starting");

    let interactive = !args.plain && stdin().is_terminal() && stdout().is_terminal();
    let outcome = if interactive {
        serve(ConsoleDriver::new()?, &args).await
    } else {
        serve(PlainDriver::new(), &args).await
    };

    match outcome {
        Ok(reason) => {
            tracing::info!(?reason, "wayfarer stopped");
            // A blocked stdin read would hold up runtime teardown.
            process::exit(0)
        },
        Err(e) => {
            tracing::error!(error = %e, "console failed");
            Err(e.into())
        },
    }
}

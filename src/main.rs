//! served-ports: report the TCP ports listening on this host
//!
//! This is the main entry point for the served-ports binary. It handles CLI
//! argument parsing, configuration loading, tracing initialization, and runs
//! the polling observer until interrupted.
//!
//! # I/O Architecture
//!
//! - **Events**: One JSON object per line on stdout, so the output can be
//!   piped into `jq` or another process
//! - **Debug logging**: Goes to stderr via `tracing`, never mixed with events

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use served_ports::{
    cli::Cli,
    config::ConfigLoader,
    portmon::{Observation, PollingObserver, ProcNetOpener},
    telemetry::{EventWriter, ObserverEvent},
};
use tokio::sync::watch;
use tracing::{debug, info};

fn main() -> Result<()> {
    // Parse CLI arguments first (before any other initialization)
    let cli = Cli::parse();

    // Load configuration with hierarchy merging
    let config = ConfigLoader::new()
        .load(&cli)
        .context("Failed to load configuration")?;

    init_tracing(cli.verbose, &config.general.log_level)?;

    debug!("Parsed CLI arguments: {:?}", cli);
    debug!("Loaded configuration: {:?}", config);

    if cli.print_config {
        print!("{}", config.to_toml().context("Failed to render configuration")?);
        return Ok(());
    }

    let net_dir = config.observer.proc_net_dir();
    let observer = PollingObserver::new(
        ProcNetOpener::with_dir(net_dir.clone()),
        config.observer.refresh_interval(),
    )
    .with_channel_capacity(config.observer.channel_capacity());
    let mut events = EventWriter::new(io::stdout());

    if cli.once {
        return list_once(&observer, &mut events);
    }

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    rt.block_on(watch_ports(observer, events, net_dir))
}

/// Read the tables a single time and print the result.
fn list_once(
    observer: &PollingObserver<ProcNetOpener>,
    events: &mut EventWriter<Stdout>,
) -> Result<()> {
    let scan = observer.scan();

    for error in &scan.errors {
        events.emit(&ObserverEvent::PollFailed {
            error: error.to_string(),
        })?;
    }

    let ports = scan
        .snapshot
        .context("IPv4 socket table could not be read")?;
    events.emit(&ObserverEvent::PortsListed { ports })?;
    Ok(())
}

/// Run the observer until Ctrl-C, printing every change and error.
async fn watch_ports(
    observer: PollingObserver<ProcNetOpener>,
    mut events: EventWriter<Stdout>,
    net_dir: PathBuf,
) -> Result<()> {
    let interval = observer.refresh_interval();
    events.emit(&ObserverEvent::ObserverStarted {
        net_dir: net_dir.display().to_string(),
        interval_ms: duration_ms(interval),
    })?;
    info!("Watching {} every {:?}", net_dir.display(), interval);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let Observation {
        mut updates,
        mut errors,
        task,
    } = observer.observe(shutdown_rx);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut errors_open = true;

    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                res.context("Failed to listen for Ctrl-C")?;
                info!("Received Ctrl-C, stopping");
                break;
            }
            update = updates.recv() => match update {
                Some(ports) => events.emit(&ObserverEvent::PortsChanged { ports })?,
                None => break,
            },
            error = errors.recv(), if errors_open => match error {
                Some(error) => events.emit(&ObserverEvent::PollFailed {
                    error: error.to_string(),
                })?,
                None => errors_open = false,
            },
        }
    }

    let _ = shutdown_tx.send(true);
    task.await.context("Observer task failed")?;
    events.emit(&ObserverEvent::ObserverStopped)?;
    Ok(())
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Initialize the tracing subscriber for debug/development logging.
///
/// # Verbosity Levels
/// - 0 (default): `RUST_LOG` if set, else the configured `log_level`
/// - 1 (-v): Info level
/// - 2 (-vv): Debug level
/// - 3+ (-vvv): Trace level
fn init_tracing(verbose: u8, log_level: &str) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}

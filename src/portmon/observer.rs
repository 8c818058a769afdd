//! Polling observer for served ports.
//!
//! On every tick the observer reads the IPv4 and IPv6 socket tables through
//! its [`TableOpener`], builds an ordered [`Snapshot`], and emits it only when
//! it differs from the last one emitted.
//!
//! # Error policy
//!
//! - IPv4 table unreadable (for any reason, missing included): the error is
//!   reported and the tick is skipped. The last snapshot stays in force.
//! - IPv6 table missing: IPv6 is treated as disabled in the kernel and
//!   contributes nothing. Nothing is reported.
//! - IPv6 table unreadable for another reason: the error is reported and
//!   IPv6 contributes nothing, but the IPv4 half is still used.
//!
//! No error ever stops the loop; the next tick is the retry.
//!
//! # Example
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() {
//! use served_ports::portmon::{Observation, PollingObserver, ProcNetOpener};
//! use std::time::Duration;
//! use tokio::sync::watch;
//!
//! let (shutdown_tx, shutdown_rx) = watch::channel(false);
//! let observer = PollingObserver::new(ProcNetOpener::new(), Duration::from_secs(1));
//! let Observation { mut updates, mut errors, .. } = observer.observe(shutdown_rx);
//!
//! tokio::spawn(async move {
//!     while let Some(err) = errors.recv().await {
//!         eprintln!("poll failed: {err}");
//!     }
//! });
//!
//! while let Some(snapshot) = updates.recv().await {
//!     for port in &snapshot {
//!         println!("{port} (localhost only: {})", port.bound_to_localhost);
//!     }
//! #   let _ = shutdown_tx.send(true);
//! }
//! # }
//! ```

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

use super::error::{PortMonError, PortMonResult};
use super::opener::TableOpener;
use super::table::{AddressFamily, ServedPort, read_table};

/// Ordered listening ports: IPv4 entries first, then IPv6, each family
/// sorted by port and then by address bytes.
pub type Snapshot = Vec<ServedPort>;

/// Default time between two polls.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Default capacity of the update and error channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

// tokio's interval panics on a zero period.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(1);

/// Result of a single poll.
#[derive(Debug, Default)]
pub struct PollOutcome {
    /// The new snapshot, if it differs from the last emitted one.
    pub changed: Option<Snapshot>,
    /// Errors worth reporting, IPv4 first.
    pub errors: Vec<PortMonError>,
}

/// Result of reading both tables once.
#[derive(Debug, Default)]
pub struct Scan {
    /// Current listening ports; `None` when the IPv4 table was unreadable.
    pub snapshot: Option<Snapshot>,
    /// Errors worth reporting, IPv4 first.
    pub errors: Vec<PortMonError>,
}

/// Channels of a running observation.
///
/// Both channels close once the observer stops.
#[derive(Debug)]
pub struct Observation {
    /// Snapshots, one per detected change.
    pub updates: mpsc::Receiver<Snapshot>,
    /// Tolerated read failures.
    pub errors: mpsc::Receiver<PortMonError>,
    /// The polling task.
    pub task: JoinHandle<()>,
}

/// Periodically polls the socket tables and reports changes.
pub struct PollingObserver<O> {
    /// Source of the socket tables.
    opener: O,
    /// Time between the starts of two polls.
    refresh_interval: Duration,
    /// Capacity of the update and error channels created by `observe`.
    channel_capacity: usize,
    /// Last snapshot handed out (empty before the first change).
    last_emitted: Snapshot,
}

impl<O: TableOpener> PollingObserver<O> {
    /// Create an observer reading tables through `opener`.
    pub fn new(opener: O, refresh_interval: Duration) -> Self {
        Self {
            opener,
            refresh_interval: refresh_interval.max(MIN_REFRESH_INTERVAL),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            last_emitted: Vec::new(),
        }
    }

    /// Set the capacity of the channels returned by [`observe`](Self::observe).
    ///
    /// A full channel blocks the polling loop until the consumer catches up.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Time between two polls.
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// The last snapshot emitted.
    pub fn last_emitted(&self) -> &[ServedPort] {
        &self.last_emitted
    }

    /// Start polling in a background task.
    ///
    /// The task stops when `shutdown_rx` turns `true` (or its sender is
    /// dropped), or when the update receiver is dropped.
    pub fn observe(self, shutdown_rx: watch::Receiver<bool>) -> Observation
    where
        O: 'static,
    {
        let (update_tx, updates) = mpsc::channel(self.channel_capacity);
        let (error_tx, errors) = mpsc::channel(self.channel_capacity);
        let task = tokio::spawn(self.run(update_tx, error_tx, shutdown_rx));

        Observation {
            updates,
            errors,
            task,
        }
    }

    /// Run the polling loop, sending changes and errors to the given channels.
    pub async fn run(
        mut self,
        update_tx: mpsc::Sender<Snapshot>,
        error_tx: mpsc::Sender<PortMonError>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut interval = tokio::time::interval(self.refresh_interval);
        // A slow tick pushes the schedule back instead of bursting to catch up
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        'poll: loop {
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown_rx) => {
                    debug!("Served-port observer received shutdown signal");
                    break;
                }
                _ = interval.tick() => {}
            }

            if update_tx.is_closed() {
                debug!("Served-port update receiver dropped, shutting down");
                break;
            }

            let outcome = self.poll_once();

            for error in outcome.errors {
                warn!("Served-port poll failed: {}", error);
                match deliver(&error_tx, error, &mut shutdown_rx).await {
                    Delivery::Shutdown => break 'poll,
                    // Nobody is listening for errors; logging them is enough
                    Delivery::Sent | Delivery::ReceiverGone => {}
                }
            }

            if let Some(snapshot) = outcome.changed {
                match deliver(&update_tx, snapshot, &mut shutdown_rx).await {
                    Delivery::Sent => {}
                    Delivery::Shutdown => break,
                    Delivery::ReceiverGone => {
                        debug!("Served-port update receiver dropped, shutting down");
                        break;
                    }
                }
            }
        }

        debug!("Served-port observer stopped");
    }

    /// Poll the tables once.
    ///
    /// Returns the snapshot if it changed since the last one returned, plus
    /// any errors to report. A changed snapshot becomes the new baseline.
    pub fn poll_once(&mut self) -> PollOutcome {
        let Scan { snapshot, errors } = self.scan();

        let Some(candidate) = snapshot else {
            return PollOutcome {
                changed: None,
                errors,
            };
        };

        if candidate == self.last_emitted {
            trace!("Served ports unchanged ({} listening)", candidate.len());
            return PollOutcome {
                changed: None,
                errors,
            };
        }

        debug!("Served ports changed: {} listening", candidate.len());
        self.last_emitted = candidate.clone();

        PollOutcome {
            changed: Some(candidate),
            errors,
        }
    }

    /// Read both tables without touching the change baseline.
    pub fn scan(&self) -> Scan {
        let mut errors = Vec::new();

        let ipv4 = self.read_family(AddressFamily::Ipv4);
        let ipv6 = self.read_family(AddressFamily::Ipv6);

        let ipv4 = match ipv4 {
            Ok(ports) => Some(ports),
            Err(e) => {
                errors.push(e);
                None
            }
        };

        let ipv6 = match ipv6 {
            Ok(ports) => ports,
            Err(e) if e.is_missing() => {
                trace!("No IPv6 socket table, assuming IPv6 is disabled");
                Vec::new()
            }
            Err(e) => {
                errors.push(e);
                Vec::new()
            }
        };

        Scan {
            snapshot: ipv4.map(|ipv4| build_snapshot(ipv4, ipv6)),
            errors,
        }
    }

    fn read_family(&self, family: AddressFamily) -> PortMonResult<Vec<ServedPort>> {
        let name = family.table_name();
        let reader = self
            .opener
            .open(name)
            .map_err(|e| PortMonError::from_io(name, e))?;
        read_table(reader, family)
    }
}

/// Merge per-family results into a snapshot.
///
/// Each family is sorted by port, then by address bytes, and duplicate
/// entries (the same address and port listed more than once, as happens
/// with `SO_REUSEPORT`) collapse into one. IPv4 precedes IPv6.
pub fn build_snapshot(mut ipv4: Vec<ServedPort>, mut ipv6: Vec<ServedPort>) -> Snapshot {
    sort_family(&mut ipv4);
    sort_family(&mut ipv6);
    ipv4.append(&mut ipv6);
    ipv4
}

fn sort_family(ports: &mut Vec<ServedPort>) {
    ports.sort_by(ServedPort::cmp_port_then_address);
    ports.dedup();
}

/// Resolves once shutdown is signalled or its sender is gone.
async fn shutdown_requested(shutdown_rx: &mut watch::Receiver<bool>) {
    let _ = shutdown_rx.wait_for(|stop| *stop).await;
}

enum Delivery {
    Sent,
    ReceiverGone,
    Shutdown,
}

/// Send `value`, giving up if shutdown is requested while the channel is full.
async fn deliver<T>(
    tx: &mpsc::Sender<T>,
    value: T,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> Delivery {
    tokio::select! {
        biased;
        _ = shutdown_requested(shutdown_rx) => Delivery::Shutdown,
        res = tx.send(value) => match res {
            Ok(()) => Delivery::Sent,
            Err(_) => Delivery::ReceiverGone,
        },
    }
}

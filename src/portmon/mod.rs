//! Served-port observation.
//!
//! This module discovers which TCP ports are being listened on by reading the
//! kernel's socket tables (`/proc/net/tcp` and `/proc/net/tcp6`):
//! - [`table`]: decoding of the textual socket-table format
//! - [`scope`]: loopback / wildcard / routable classification of bind addresses
//! - [`opener`]: the injectable capability used to open the tables
//! - [`observer`]: the polling loop that turns table reads into a change stream
//!
//! # The IPv6 blind spot
//!
//! Many dev servers (Node.js, Vite, Python's http.server) bind to `::` by
//! default. Such sockets only show up in `tcp6`, so both tables are always
//! read and merged into one [`Snapshot`].

pub mod error;
pub mod observer;
pub mod opener;
pub mod scope;
pub mod table;

pub use error::{PortMonError, PortMonResult};
pub use observer::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_REFRESH_INTERVAL, Observation, PollOutcome,
    PollingObserver, Scan, Snapshot, build_snapshot,
};
pub use opener::{PROC_NET_DIR, ProcNetOpener, TableOpener, TableReader};
pub use scope::{BindScope, is_bound_to_localhost};
pub use table::{AddressFamily, ServedPort, TCP_LISTEN, read_table};

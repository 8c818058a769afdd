//! Command-line interface definitions for served-ports.
//!
//! Uses clap's derive API for type-safe argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Watch the kernel socket tables and report listening TCP ports.
///
/// served-ports polls `tcp` and `tcp6` under `/proc/net` (or another
/// process's `/proc/<pid>/net`) and prints one JSON line per change in the
/// set of listening ports, and one per tolerated read failure.
#[derive(Parser, Debug)]
#[command(name = "served-ports")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Observe the network namespace of this process.
    ///
    /// Reads `/proc/<PID>/net/tcp{,6}` instead of `/proc/net/tcp{,6}`, which
    /// allows watching a container's ports from the host.
    #[arg(long = "pid", value_name = "PID", conflicts_with = "proc_net_dir")]
    pub pid: Option<u32>,

    /// Directory containing the `tcp` and `tcp6` tables.
    #[arg(long = "proc-net-dir", value_name = "DIR")]
    pub proc_net_dir: Option<PathBuf>,

    /// Time between two polls, in milliseconds.
    #[arg(short = 'i', long = "interval-ms", value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Path to additional config file.
    ///
    /// This config file is merged on top of system and user configs,
    /// giving it the highest priority (except for CLI flags).
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Poll once, print the current snapshot and exit.
    #[arg(long = "once")]
    pub once: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long = "print-config")]
    pub print_config: bool,

    /// Increase log verbosity.
    ///
    /// Can be specified multiple times:
    /// -v    = info level
    /// -vv   = debug level
    /// -vvv  = trace level
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Table directory requested on the command line, if any.
    pub fn proc_net_override(&self) -> Option<PathBuf> {
        match (self.pid, &self.proc_net_dir) {
            (Some(pid), _) => Some(PathBuf::from(format!("/proc/{pid}/net"))),
            (None, Some(dir)) => Some(dir.clone()),
            (None, None) => None,
        }
    }
}

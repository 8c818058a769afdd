//! served-ports: observe which TCP ports are listening on a Linux host
//!
//! This crate reads the kernel's socket tables (`/proc/net/tcp` and
//! `/proc/net/tcp6`), decodes the listening sockets, and reports every change
//! in the set of served ports as an ordered snapshot.
//!
//! # Architecture
//!
//! - **Portmon**: Table decoding, bind-scope classification, and the polling observer
//! - **Config**: Hierarchical TOML configuration
//! - **Telemetry**: JSON-lines event output
//! - **CLI**: Command-line definitions for the `served-ports` binary

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod portmon;
pub mod telemetry;

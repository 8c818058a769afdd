//! Structured event output for served-ports.
//!
//! Observer events are written to stdout as JSON lines, one object per
//! event. Diagnostic logs are a separate concern and go to stderr via
//! `tracing`.
//!
//! # Usage
//!
//! ```
//! use served_ports::telemetry::{EventWriter, ObserverEvent};
//!
//! let mut writer = EventWriter::new(Vec::new());
//! writer.emit(&ObserverEvent::ObserverStopped).unwrap();
//! ```
//!
//! # Event Format
//!
//! ```json
//! {"ts":"2026-01-07T14:32:01Z","event":"ports_changed","ports":[{"address":"127.0.0.1","port":8080,"bound_to_localhost":true}]}
//! ```

mod error;
mod events;
mod writer;

pub use error::TelemetryError;
pub use events::{ObserverEvent, TimestampedEvent};
pub use writer::EventWriter;

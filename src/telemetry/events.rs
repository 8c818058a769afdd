//! Observer event types for structured output.
//!
//! Each event is serialized as a single JSON object with an ISO8601 `ts`
//! field and an `event` tag naming the variant.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::portmon::ServedPort;

/// Events emitted by the served-ports command.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ObserverEvent {
    /// The polling observer was started.
    ObserverStarted {
        /// Directory the socket tables are read from.
        net_dir: String,
        /// Time between two polls, in milliseconds.
        interval_ms: u64,
    },

    /// The set of listening ports changed.
    PortsChanged {
        /// The complete new snapshot.
        ports: Vec<ServedPort>,
    },

    /// Result of a single poll (`--once`).
    PortsListed {
        /// Listening ports at the time of the poll.
        ports: Vec<ServedPort>,
    },

    /// A poll failed or was degraded.
    PollFailed {
        /// Human-readable description of the failure.
        error: String,
    },

    /// The polling observer stopped.
    ObserverStopped,
}

/// Wrapper for serializing events with timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct TimestampedEvent<'a> {
    /// ISO8601 timestamp.
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,

    /// The actual event (flattened into this struct).
    #[serde(flatten)]
    pub event: &'a ObserverEvent,
}

impl ObserverEvent {
    /// Wrap this event with a timestamp for serialization.
    pub fn with_timestamp(&self) -> TimestampedEvent<'_> {
        TimestampedEvent {
            timestamp: Utc::now(),
            event: self,
        }
    }
}

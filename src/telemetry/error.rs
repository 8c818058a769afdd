//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while writing observer events.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to write to the event sink.
    #[error("Failed to write event: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize event to JSON.
    #[error("Failed to serialize event: {0}")]
    SerializationError(#[from] serde_json::Error),
}

//! JSON-lines event sink.

use std::io::Write;

use tracing::debug;

use super::error::TelemetryError;
use super::events::ObserverEvent;

/// Writes one timestamped JSON object per line to any [`Write`] sink.
///
/// The sink is flushed after every event so that consumers reading a pipe
/// see each change as soon as it is observed.
pub struct EventWriter<W: Write> {
    out: W,
}

impl<W: Write> EventWriter<W> {
    /// Create a writer over the given sink.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Serialize and write a single event.
    pub fn emit(&mut self, event: &ObserverEvent) -> Result<(), TelemetryError> {
        let json = serde_json::to_string(&event.with_timestamp())?;
        self.out.write_all(json.as_bytes())?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        debug!("Emitted event: {}", json);
        Ok(())
    }

    /// Consume the writer and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv6Addr};

    use crate::portmon::ServedPort;

    #[test]
    fn test_events_are_newline_delimited() {
        let mut writer = EventWriter::new(Vec::new());

        writer
            .emit(&ObserverEvent::PortsChanged {
                ports: vec![ServedPort::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 22)],
            })
            .unwrap();
        writer.emit(&ObserverEvent::ObserverStopped).unwrap();

        let output = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "ports_changed");
        assert_eq!(first["ports"][0]["address"], "::");
        assert_eq!(first["ports"][0]["port"], 22);
        assert_eq!(first["ports"][0]["bound_to_localhost"], false);

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["event"], "observer_stopped");
        assert!(second["ts"].is_string());
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_reported() {
        let mut writer = EventWriter::new(BrokenPipe);
        let err = writer.emit(&ObserverEvent::ObserverStopped).unwrap_err();
        assert!(matches!(err, TelemetryError::Io(_)));
    }
}

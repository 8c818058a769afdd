//! Error types for served-port observation.
//!
//! This module defines errors for:
//! - Opening a kernel socket table (missing vs. other I/O failures)
//! - Parsing a socket table record

use std::io;
use thiserror::Error;

use super::table::AddressFamily;

/// Errors from served-port observation.
#[derive(Debug, Error)]
pub enum PortMonError {
    /// A socket table record did not match the expected structure.
    ///
    /// The whole table read for that family is discarded.
    #[error("Malformed {family} socket table at line {line}: {message}")]
    Parse {
        /// Address family of the table being parsed.
        family: AddressFamily,
        /// 1-based line number of the offending record.
        line: usize,
        /// What was wrong with the record.
        message: String,
    },

    /// The socket table does not exist.
    #[error("Socket table '{table}' does not exist: {source}")]
    TableMissing {
        /// Name of the table (e.g. `tcp6`).
        table: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Any other failure opening or reading a socket table.
    #[error("Failed to read socket table '{table}': {source}")]
    TableRead {
        /// Name of the table (e.g. `tcp`).
        table: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl PortMonError {
    /// Classify an I/O error from opening or reading `table`.
    pub fn from_io(table: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::TableMissing {
                table: table.to_string(),
                source,
            }
        } else {
            Self::TableRead {
                table: table.to_string(),
                source,
            }
        }
    }

    /// Build a parse error for `family` at `line`.
    pub(crate) fn parse(family: AddressFamily, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            family,
            line,
            message: message.into(),
        }
    }

    /// Whether this error means the table does not exist at all.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::TableMissing { .. })
    }
}

/// Result type for served-port operations.
pub type PortMonResult<T> = Result<T, PortMonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_missing() {
        let err = PortMonError::from_io(
            "tcp6",
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        assert!(err.is_missing());
        assert!(err.to_string().contains("tcp6"));
    }

    #[test]
    fn test_other_io_is_read_error() {
        let err = PortMonError::from_io(
            "tcp",
            io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        );
        assert!(!err.is_missing());
        assert!(matches!(err, PortMonError::TableRead { .. }));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn test_parse_error_names_family_and_line() {
        let err = PortMonError::parse(AddressFamily::Ipv6, 3, "invalid hex");
        let msg = err.to_string();
        assert!(msg.contains("IPv6"));
        assert!(msg.contains("line 3"));
        assert!(msg.contains("invalid hex"));
    }
}

//! Access to the kernel socket tables.
//!
//! The observer never touches the filesystem directly; it asks a
//! [`TableOpener`] for a table by name (`tcp`, `tcp6`). Production code uses
//! [`ProcNetOpener`], tests hand in a closure returning fixture bytes.
//!
//! # Observing another network namespace
//!
//! `/proc/net` is a view of the *calling* process's network namespace. To
//! observe a workspace from outside, read `/proc/<pid>/net` of any process
//! inside it ([`ProcNetOpener::for_pid`]). This needs no extra privileges for
//! processes the caller can already inspect, unlike `ip netns exec`.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Default directory holding the socket tables.
pub const PROC_NET_DIR: &str = "/proc/net";

/// Byte stream of one socket table.
pub type TableReader = Box<dyn Read + Send>;

/// Capability to open a socket table by name.
///
/// A table that does not exist must be reported as
/// [`io::ErrorKind::NotFound`]; the observer treats a missing `tcp6` as
/// "IPv6 disabled" rather than as a failure.
pub trait TableOpener: Send {
    /// Open the table called `name`.
    fn open(&self, name: &str) -> io::Result<TableReader>;
}

impl<F> TableOpener for F
where
    F: Fn(&str) -> io::Result<TableReader> + Send,
{
    fn open(&self, name: &str) -> io::Result<TableReader> {
        self(name)
    }
}

/// Opens tables from a `net` directory such as `/proc/net`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcNetOpener {
    net_dir: PathBuf,
}

impl ProcNetOpener {
    /// Opener for the current network namespace (`/proc/net`).
    #[must_use]
    pub fn new() -> Self {
        Self::with_dir(PROC_NET_DIR)
    }

    /// Opener for the network namespace of process `pid`.
    #[must_use]
    pub fn for_pid(pid: u32) -> Self {
        Self::with_dir(format!("/proc/{pid}/net"))
    }

    /// Opener for an arbitrary directory (fixtures, alternate procfs mounts).
    #[must_use]
    pub fn with_dir(net_dir: impl Into<PathBuf>) -> Self {
        Self {
            net_dir: net_dir.into(),
        }
    }

    /// Directory tables are read from.
    pub fn net_dir(&self) -> &Path {
        &self.net_dir
    }
}

impl Default for ProcNetOpener {
    fn default() -> Self {
        Self::new()
    }
}

impl TableOpener for ProcNetOpener {
    fn open(&self, name: &str) -> io::Result<TableReader> {
        let file = File::open(self.net_dir.join(name))?;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_paths() {
        assert_eq!(ProcNetOpener::new().net_dir(), Path::new("/proc/net"));
        assert_eq!(ProcNetOpener::for_pid(4242).net_dir(), Path::new("/proc/4242/net"));
    }

    #[test]
    fn test_opens_file_from_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("tcp"), "header\n").unwrap();

        let opener = ProcNetOpener::with_dir(dir.path());
        let mut content = String::new();
        opener
            .open("tcp")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();

        assert_eq!(content, "header\n");
    }

    #[test]
    fn test_missing_table_is_not_found() {
        let dir = tempdir().unwrap();
        let opener = ProcNetOpener::with_dir(dir.path());

        let err = opener.open("tcp6").err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_closure_opener() {
        let opener = |name: &str| -> io::Result<TableReader> {
            if name == "tcp" {
                Ok(Box::new(io::Cursor::new(b"header\n".to_vec())))
            } else {
                Err(io::Error::from(io::ErrorKind::NotFound))
            }
        };

        assert!(opener.open("tcp").is_ok());
        assert_eq!(
            opener.open("tcp6").err().unwrap().kind(),
            io::ErrorKind::NotFound
        );
    }
}

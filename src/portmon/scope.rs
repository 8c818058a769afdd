//! Bind-scope classification for listening sockets.
//!
//! A socket bound to the loopback address only accepts local connections.
//! A socket bound to the wildcard address accepts on every interface,
//! loopback included, but is *not* considered loopback-bound.

use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Where a listening socket accepts connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindScope {
    /// Bound to 127.0.0.1 or ::1.
    Loopback,
    /// Bound to 0.0.0.0 or :: (all interfaces).
    Wildcard,
    /// Bound to one specific, non-loopback address.
    Routable,
}

impl BindScope {
    /// Classify a decoded local address.
    ///
    /// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) are classified by their
    /// embedded IPv4 address, so `::ffff:127.0.0.1` is loopback.
    pub fn classify(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(v4) => Self::classify_v4(v4),
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => Self::classify_v4(&v4),
                None if *v6 == Ipv6Addr::LOCALHOST => Self::Loopback,
                None if *v6 == Ipv6Addr::UNSPECIFIED => Self::Wildcard,
                None => Self::Routable,
            },
        }
    }

    // Only the exact loopback constant counts; 127.0.0.2 is routable here.
    fn classify_v4(v4: &Ipv4Addr) -> Self {
        if *v4 == Ipv4Addr::LOCALHOST {
            Self::Loopback
        } else if *v4 == Ipv4Addr::UNSPECIFIED {
            Self::Wildcard
        } else {
            Self::Routable
        }
    }
}

/// Whether `addr` is the loopback address of its family.
pub fn is_bound_to_localhost(addr: &IpAddr) -> bool {
    BindScope::classify(addr) == BindScope::Loopback
}

//! Decoding of the kernel's TCP socket tables (`/proc/net/tcp{,6}`).
//!
//! Format (each line after header):
//! ```text
//!    sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
//!    0: 0100007F:170C 00000000:0000 0A 00000000:00000000 00:00000000 00000000 33333        0 57019442 ...
//! ```
//!
//! For tcp6, the address is 128-bit (32 hex chars) instead of 32-bit (8 hex chars).
//! Only the local address and the state column are interpreted; everything
//! else on the line is ignored.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use super::error::{PortMonError, PortMonResult};
use super::scope::{BindScope, is_bound_to_localhost};

/// TCP state code for a socket accepting new connections (`TCP_LISTEN`).
pub const TCP_LISTEN: u8 = 0x0A;

/// Minimum number of columns in a record: `sl`, local, remote, state.
const MIN_RECORD_FIELDS: usize = 4;

/// Hex digits in the port half of an `address:port` column.
const PORT_HEX_LEN: usize = 4;

/// Hex digits in one 32-bit kernel word.
const WORD_HEX_LEN: usize = 8;

/// Address family of a socket table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// `/proc/net/tcp`
    Ipv4,
    /// `/proc/net/tcp6`
    Ipv6,
}

impl AddressFamily {
    /// File name of this family's table inside a `net` directory.
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Ipv4 => "tcp",
            Self::Ipv6 => "tcp6",
        }
    }

    fn address_hex_len(self) -> usize {
        match self {
            Self::Ipv4 => 8,
            Self::Ipv6 => 32,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ipv4 => f.write_str("IPv4"),
            Self::Ipv6 => f.write_str("IPv6"),
        }
    }
}

/// A listening socket observed in a socket table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServedPort {
    /// Local address the socket is bound to.
    pub address: IpAddr,
    /// Port number.
    pub port: u16,
    /// Whether `address` is the loopback address of its family.
    pub bound_to_localhost: bool,
}

impl ServedPort {
    /// Create a served port, deriving `bound_to_localhost` from the address.
    pub fn new(address: IpAddr, port: u16) -> Self {
        Self {
            bound_to_localhost: is_bound_to_localhost(&address),
            address,
            port,
        }
    }

    /// Bind scope of this port's address.
    pub fn scope(&self) -> BindScope {
        BindScope::classify(&self.address)
    }

    /// Snapshot ordering: port first, then the raw address bytes.
    pub fn cmp_port_then_address(&self, other: &Self) -> Ordering {
        self.port
            .cmp(&other.port)
            .then_with(|| address_bytes(&self.address).cmp(&address_bytes(&other.address)))
    }
}

impl fmt::Display for ServedPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", SocketAddr::new(self.address, self.port))
    }
}

/// 16-byte representation of an address; IPv4 uses the IPv4-mapped form.
fn address_bytes(addr: &IpAddr) -> [u8; 16] {
    match addr {
        IpAddr::V4(v4) => v4.to_ipv6_mapped().octets(),
        IpAddr::V6(v6) => v6.octets(),
    }
}

/// Read a socket table and return its listening sockets in file order.
///
/// The first line is the column header and is skipped, as are blank lines
/// and repeated headers. Any malformed record fails the whole read.
pub fn read_table<R: Read>(reader: R, family: AddressFamily) -> PortMonResult<Vec<ServedPort>> {
    let mut ports = Vec::new();

    for (idx, line) in BufReader::new(reader).lines().enumerate() {
        let line = line.map_err(|source| PortMonError::TableRead {
            table: family.table_name().to_string(),
            source,
        })?;
        if idx == 0 {
            continue;
        }

        match parse_record(&line, family) {
            Ok(Some(port)) => ports.push(port),
            Ok(None) => {}
            Err(message) => return Err(PortMonError::parse(family, idx + 1, message)),
        }
    }

    Ok(ports)
}

/// Parse one table line. Returns `None` for non-listening or non-record lines.
fn parse_record(line: &str, family: AddressFamily) -> Result<Option<ServedPort>, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.is_empty() || fields[0] == "sl" {
        return Ok(None);
    }
    if fields.len() < MIN_RECORD_FIELDS {
        return Err(format!(
            "expected at least {} fields, found {}",
            MIN_RECORD_FIELDS,
            fields.len()
        ));
    }

    let (address, port) = decode_local_address(fields[1], family)?;

    if decode_state(fields[3])? != TCP_LISTEN {
        return Ok(None);
    }

    Ok(Some(ServedPort::new(address, port)))
}

/// Parse the two-hex-digit connection state column.
fn decode_state(s: &str) -> Result<u8, String> {
    if s.len() != 2 || !is_hex(s) {
        return Err(format!("invalid state code: {s:?}"));
    }
    u8::from_str_radix(s, 16).map_err(|_| format!("invalid state code: {s:?}"))
}

/// Decode an `ADDR:PORT` column for `family`.
fn decode_local_address(s: &str, family: AddressFamily) -> Result<(IpAddr, u16), String> {
    let (addr_hex, port_hex) = s
        .split_once(':')
        .ok_or_else(|| format!("invalid {family} address format: {s:?}"))?;

    if addr_hex.len() != family.address_hex_len() {
        return Err(format!(
            "invalid {family} address length: expected {} hex chars, got {}",
            family.address_hex_len(),
            addr_hex.len()
        ));
    }

    let address = match family {
        AddressFamily::Ipv4 => IpAddr::V4(Ipv4Addr::from(decode_kernel_words::<4>(addr_hex)?)),
        AddressFamily::Ipv6 => IpAddr::V6(Ipv6Addr::from(decode_kernel_words::<16>(addr_hex)?)),
    };

    Ok((address, decode_port(port_hex)?))
}

/// Decode the port half of an address column.
///
/// The kernel prints the port already converted to host order with `%04X`,
/// so the digits read as a plain big-endian number.
fn decode_port(s: &str) -> Result<u16, String> {
    if s.len() != PORT_HEX_LEN || !is_hex(s) {
        return Err(format!("invalid port: {s:?}"));
    }
    u16::from_str_radix(s, 16).map_err(|_| format!("invalid port: {s:?}"))
}

/// Byte-order transform for kernel-printed addresses.
///
/// The kernel keeps addresses in network byte order in memory but prints
/// them as 32-bit words with `%08X`, i.e. as numbers read in host byte
/// order. On the little-endian hosts these tables come from, each word's
/// text is therefore the reverse of its network-order bytes:
///
/// ```text
/// "0100007F"  ->  0x0100007F  ->  LE bytes [7F 00 00 01]  ->  127.0.0.1
/// ```
///
/// Each word is reversed on its own; the words stay in textual order.
/// IPv4 is one word, IPv6 is four.
fn decode_kernel_words<const N: usize>(hex: &str) -> Result<[u8; N], String> {
    if hex.len() != N * 2 || !is_hex(hex) {
        return Err(format!("invalid address: {hex:?}"));
    }

    let mut octets = [0u8; N];
    for (i, chunk) in octets.chunks_exact_mut(4).enumerate() {
        let word_hex = &hex[i * WORD_HEX_LEN..(i + 1) * WORD_HEX_LEN];
        let word = u32::from_str_radix(word_hex, 16)
            .map_err(|_| format!("invalid address word: {word_hex:?}"))?;
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    Ok(octets)
}

// `from_str_radix` accepts a leading sign, so digits are checked up front.
fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

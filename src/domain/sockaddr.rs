//! Link-layer socket address record.
//!
//! Every message crossing the upward interface starts with one of these
//! records. On the way down it names the destination; on the way up it names
//! the sender.

use std::fmt;

use macaddr::MacAddr6;

/// Size of the generic socket-address header: length, flags, type, prefix.
pub const SOCKADDR_OVERHEAD: usize = 8;

/// Size of the full Ethernet socket-address record.
pub const ETH_SOCKADDR_SIZE: usize = 16;

/// Flag bit marking a broadcast address.
pub const FLAG_BROADCAST: u8 = 1;

/// Ethernet variant of the socket-address record.
///
/// Wire layout (native endian, 16 bytes):
/// `addr_len u16 | flags u8 | type u8 | prefix u32 | zero u16 | mac [u8; 6]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthSockaddr {
    /// Peer MAC address
    pub mac: MacAddr6,
    /// Whether the message was (or should be) sent to every station
    pub broadcast: bool,
}

impl EthSockaddr {
    /// Address a single peer.
    pub fn unicast(mac: MacAddr6) -> Self {
        Self {
            mac,
            broadcast: false,
        }
    }

    /// Address every station on the segment.
    pub fn broadcast() -> Self {
        Self {
            mac: MacAddr6::from([0xff; 6]),
            broadcast: true,
        }
    }

    /// Read the `addr_len` field from the front of a record.
    ///
    /// Returns `None` if fewer than [`SOCKADDR_OVERHEAD`] bytes are present.
    pub fn record_len(bytes: &[u8]) -> Option<u16> {
        if bytes.len() < SOCKADDR_OVERHEAD {
            return None;
        }
        Some(u16::from_ne_bytes([bytes[0], bytes[1]]))
    }

    /// Decode a full-size record. Missing trailing bytes of a short record
    /// must already be zero-filled by the caller.
    pub fn from_bytes(bytes: &[u8; ETH_SOCKADDR_SIZE]) -> Self {
        let mut mac = [0u8; 6];
        mac.copy_from_slice(&bytes[10..16]);
        Self {
            mac: MacAddr6::from(mac),
            broadcast: bytes[2] & FLAG_BROADCAST != 0,
        }
    }

    /// Encode as a full-size record.
    pub fn to_bytes(&self) -> [u8; ETH_SOCKADDR_SIZE] {
        let mut out = [0u8; ETH_SOCKADDR_SIZE];
        out[0..2].copy_from_slice(&(ETH_SOCKADDR_SIZE as u16).to_ne_bytes());
        if self.broadcast {
            out[2] = FLAG_BROADCAST;
        }
        out[10..16].copy_from_slice(self.mac.as_bytes());
        out
    }
}

impl fmt::Display for EthSockaddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.broadcast {
            write!(f, "{} (broadcast)", self.mac)
        } else {
            write!(f, "{}", self.mac)
        }
    }
}

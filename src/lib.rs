//! Etherlink - raw Ethernet transport for a packet-switched mesh.
//!
//! The crate moves opaque messages between nodes on the same LAN by wrapping
//! them in Ethernet frames with a private EtherType. On hosts with Berkeley
//! Packet Filter devices it opens `/dev/bpf*`, binds it to an interface and
//! installs a kernel filter so only this protocol's frames are delivered.
//!
//! # Layout
//!
//! - [`capture`]: device acquisition and configuration
//! - [`netif`]: interface enumeration and MAC lookup
//! - [`codec`]: wire header, Ethernet header, and BPF read-buffer parsing
//! - [`adapter`]: the send and receive paths tying it all together
//! - [`domain`]: messages, address records, and per-frame scratch space
//! - [`reporter`]: upward delivery

pub mod adapter;
pub mod capture;
pub mod codec;
pub mod config;
pub mod domain;
pub mod error;
pub mod netif;
pub mod reporter;

#[cfg(test)]
pub(crate) mod testing;

pub use adapter::{EthInterface, LinkStats};
pub use capture::{AcquirePolicy, LinkDevice};
pub use config::Config;
pub use domain::{EthSockaddr, Message, ScratchArena};
pub use error::{AdapterError, ConfigError, DeviceError, InterfaceError, MessageError, SendError};
pub use reporter::{ConsoleReporter, MessageSink};

#[cfg(any(target_os = "macos", target_os = "ios"))]
pub use capture::BpfDevice;

/// EtherType carried by every frame of this protocol.
pub const ETHERTYPE: u16 = 0xfc00;

/// Largest payload a single frame may carry, after the wire header.
pub const MAX_PACKET_SIZE: usize = 1496;

/// Headroom reserved in front of every inbound message for upper layers.
pub const MESSAGE_PADDING: usize = 512;

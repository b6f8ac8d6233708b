//! Error types for the Ethernet link adapter.
//!
//! Construction-time failures are surfaced through these types. Per-packet
//! problems on the receive and send paths are logged and counted instead.

use std::io;

use thiserror::Error;

/// Errors from acquiring or configuring a capture device.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("could not find an available /dev/bpf device after {attempts} sweeps of {units} units")]
    Exhausted { attempts: u32, units: u32 },

    #[error("interface name '{0}' is too long for a capture device")]
    InterfaceNameTooLong(String),

    #[error("ioctl({op}) failed: {source}")]
    Ioctl {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("kernel reported an unusable buffer length: {0}")]
    BufferLength(u32),

    #[error("insufficient permissions to open a capture device")]
    InsufficientPermissions,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors from enumerating interfaces or resolving their addresses.
#[derive(Error, Debug)]
pub enum InterfaceError {
    #[error("failed to enumerate network interfaces: {0}")]
    Enumerate(#[source] io::Error),

    #[error("could not find mac address for [{0}]")]
    NoMacAddress(String),
}

/// Bounds violations on a [`Message`](crate::domain::Message).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("not enough headroom: need {needed} bytes, have {available}")]
    Headroom { needed: usize, available: usize },

    #[error("message too short: need {needed} bytes, have {available}")]
    Underflow { needed: usize, available: usize },

    #[error("cannot truncate a {len} byte message to {requested} bytes")]
    Truncate { len: usize, requested: usize },
}

/// Caller errors on the send path.
///
/// Transient device failures are not reported here; they are logged and the
/// send is dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("address record length {0} is outside the valid range")]
    BadAddressLength(u16),

    #[error("malformed message: {0}")]
    Message(#[from] MessageError),
}

/// Errors that prevent an adapter from being constructed.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Interface(#[from] InterfaceError),
}

/// Errors from loading the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),
}

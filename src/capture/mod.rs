//! Capture device abstraction.
//!
//! This module defines the `LinkDevice` trait (DIP) and provides a BPF-based
//! implementation on the platforms that have `/dev/bpf*`. The adapter only
//! ever talks to the trait, which keeps it testable with scripted devices.

mod filter;

#[cfg(any(target_os = "macos", target_os = "ios"))]
mod bindings;
#[cfg(any(target_os = "macos", target_os = "ios"))]
mod bpf_device;

pub use filter::{ethertype_filter, BpfInsn};

#[cfg(any(target_os = "macos", target_os = "ios"))]
pub use bpf_device::BpfDevice;

use std::io;
use std::thread;
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::DeviceError;

/// A raw link-layer device that reads batches and writes whole frames.
pub trait LinkDevice {
    /// Read whatever the kernel has ready into `buf`.
    ///
    /// Non-blocking devices return `ErrorKind::WouldBlock` when nothing is
    /// pending.
    fn read_batch(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write one complete Ethernet frame, returning the bytes accepted.
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<usize>;
}

/// How hard to look for a free capture device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquirePolicy {
    /// Device units probed per sweep (`/dev/bpf0` .. `/dev/bpf{units-1}`)
    pub units: u32,
    /// Number of sweeps before giving up
    pub attempts: u32,
    /// Pause between sweeps
    pub interval: Duration,
}

impl Default for AcquirePolicy {
    fn default() -> Self {
        Self {
            units: 256,
            attempts: 100,
            interval: Duration::from_millis(100),
        }
    }
}

/// Probe device units until one opens.
///
/// Every unit in `0..policy.units` is tried in order; when a whole sweep
/// fails the loop sleeps for `policy.interval` and starts over, at most
/// `policy.attempts` times. A permission error ends the search at once since
/// retrying cannot fix it.
pub fn acquire<T, F>(policy: &AcquirePolicy, mut probe: F) -> Result<T, DeviceError>
where
    F: FnMut(u32) -> io::Result<T>,
{
    for attempt in 0..policy.attempts {
        for unit in 0..policy.units {
            match probe(unit) {
                Ok(device) => {
                    debug!(unit, attempt, "Acquired capture device");
                    return Ok(device);
                }
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                    return Err(DeviceError::InsufficientPermissions);
                }
                Err(e) => trace!(unit, "Capture device unavailable: {}", e),
            }
        }

        if attempt + 1 < policy.attempts {
            debug!(attempt, "No free capture device, retrying");
            thread::sleep(policy.interval);
        }
    }

    Err(DeviceError::Exhausted {
        attempts: policy.attempts,
        units: policy.units,
    })
}

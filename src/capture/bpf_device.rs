//! BPF capture device (`/dev/bpf*`).

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::mem::{self, MaybeUninit};
use std::os::unix::io::{AsRawFd, RawFd};
use std::ptr;

use tracing::{debug, info};

use super::bindings::{self, bpf_program, ifreq};
use super::{acquire, ethertype_filter, AcquirePolicy, LinkDevice};
use crate::error::DeviceError;
use crate::ETHERTYPE;

/// An open BPF device.
///
/// The descriptor is closed exactly once, when the device is dropped.
#[derive(Debug)]
pub struct BpfDevice {
    file: File,
    buffer_len: usize,
}

impl BpfDevice {
    /// Acquire a free device node and configure it to carry this protocol's
    /// frames on `if_name`.
    pub fn open(if_name: &str, policy: &AcquirePolicy) -> Result<Self, DeviceError> {
        let mut device = Self::acquire(policy)?;
        device.configure(if_name)?;
        Ok(device)
    }

    /// Find and open an unused `/dev/bpfN` node.
    pub fn acquire(policy: &AcquirePolicy) -> Result<Self, DeviceError> {
        let file = acquire(policy, |unit| {
            OpenOptions::new()
                .read(true)
                .write(true)
                .open(format!("/dev/bpf{unit}"))
        })?;
        Ok(Self {
            file,
            buffer_len: 0,
        })
    }

    /// Bind to the interface, enable immediate mode, read the kernel buffer
    /// length, install the EtherType filter and go non-blocking.
    ///
    /// Any failure here is final; nothing is retried.
    pub fn configure(&mut self, if_name: &str) -> Result<(), DeviceError> {
        self.bind(if_name)?;
        self.set_immediate()?;
        self.buffer_len = self.query_buffer_len()?;
        debug!(buffer_len = self.buffer_len, "ioctl(BIOCGBLEN)");
        self.install_filter()?;
        self.set_nonblocking()?;
        info!(interface = if_name, buffer_len = self.buffer_len, "BPF device configured");
        Ok(())
    }

    /// Read buffer length negotiated with the kernel. Reads must use a buffer
    /// of exactly this size.
    pub fn buffer_len(&self) -> usize {
        self.buffer_len
    }

    fn bind(&mut self, if_name: &str) -> Result<(), DeviceError> {
        let name = if_name.as_bytes();
        if name.len() >= libc::IFNAMSIZ || name.contains(&0) {
            return Err(DeviceError::InterfaceNameTooLong(if_name.to_string()));
        }

        // SAFETY: ifreq is plain old data; all-zero is a valid value.
        let mut ifr: ifreq = unsafe { MaybeUninit::zeroed().assume_init() };
        // SAFETY: the name is shorter than IFNAMSIZ, so the copy stays inside
        // ifr_name and leaves a NUL terminator behind it.
        unsafe {
            ptr::copy_nonoverlapping(
                name.as_ptr().cast::<libc::c_char>(),
                ifr.ifr_name.as_mut_ptr(),
                name.len(),
            );
        }
        self.ioctl("BIOCSETIF", bindings::BIOCSETIF, &mut ifr as *mut ifreq as *mut libc::c_void)
    }

    fn set_immediate(&mut self) -> Result<(), DeviceError> {
        let mut enable: libc::c_uint = 1;
        self.ioctl(
            "BIOCIMMEDIATE",
            bindings::BIOCIMMEDIATE,
            &mut enable as *mut libc::c_uint as *mut libc::c_void,
        )
    }

    fn query_buffer_len(&mut self) -> Result<usize, DeviceError> {
        let mut len: libc::c_uint = 0;
        self.ioctl(
            "BIOCGBLEN",
            bindings::BIOCGBLEN,
            &mut len as *mut libc::c_uint as *mut libc::c_void,
        )?;
        if len == 0 || len > i32::MAX as libc::c_uint {
            return Err(DeviceError::BufferLength(len));
        }
        Ok(len as usize)
    }

    fn install_filter(&mut self) -> Result<(), DeviceError> {
        let insns = ethertype_filter(ETHERTYPE);
        let mut program = bpf_program {
            bf_len: insns.len() as libc::c_uint,
            bf_insns: insns.as_ptr(),
        };
        // The kernel copies the program during the call; `insns` only has to
        // outlive the ioctl.
        self.ioctl(
            "BIOCSETF",
            bindings::BIOCSETF,
            &mut program as *mut bpf_program as *mut libc::c_void,
        )
    }

    fn set_nonblocking(&mut self) -> Result<(), DeviceError> {
        let fd = self.as_raw_fd();
        // SAFETY: fcntl on a descriptor we own, no Rust memory involved.
        unsafe {
            let flags = libc::fcntl(fd, libc::F_GETFL);
            if flags < 0 {
                return Err(DeviceError::Io(io::Error::last_os_error()));
            }
            if libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) < 0 {
                return Err(DeviceError::Io(io::Error::last_os_error()));
            }
        }
        Ok(())
    }

    fn ioctl(
        &mut self,
        op: &'static str,
        request: libc::c_ulong,
        arg: *mut libc::c_void,
    ) -> Result<(), DeviceError> {
        // SAFETY: every caller passes a pointer to a live value of the type
        // the request encodes in its size bits.
        let rc = unsafe { libc::ioctl(self.file.as_raw_fd(), request, arg) };
        if rc == -1 {
            return Err(DeviceError::Ioctl {
                op,
                source: io::Error::last_os_error(),
            });
        }
        Ok(())
    }
}

impl LinkDevice for BpfDevice {
    fn read_batch(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn write_frame(&mut self, frame: &[u8]) -> io::Result<usize> {
        self.file.write(frame)
    }
}

impl AsRawFd for BpfDevice {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

const _: () = assert!(mem::size_of::<ifreq>() == 32);

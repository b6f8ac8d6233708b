//! Darwin BPF ioctl requests and the structures they take.

#![allow(non_camel_case_types)]

use std::mem;

use super::BpfInsn;

const IOCPARM_MASK: libc::c_ulong = 0x1fff;
const IOC_OUT: libc::c_ulong = 0x4000_0000;
const IOC_IN: libc::c_ulong = 0x8000_0000;

/// `_IOC(inout, group, num, len)` from <sys/ioccom.h>.
const fn ioc(inout: libc::c_ulong, group: u8, num: u8, len: usize) -> libc::c_ulong {
    inout | ((len as libc::c_ulong & IOCPARM_MASK) << 16) | ((group as libc::c_ulong) << 8) | num as libc::c_ulong
}

#[repr(C)]
pub(crate) struct ifreq {
    pub(crate) ifr_name: [libc::c_char; libc::IFNAMSIZ],
    pub(crate) ifr_ifru: [u8; 16],
}

#[repr(C)]
pub(crate) struct bpf_program {
    pub(crate) bf_len: libc::c_uint,
    pub(crate) bf_insns: *const BpfInsn,
}

/// Get the kernel buffer length for reads.
pub(crate) const BIOCGBLEN: libc::c_ulong = ioc(IOC_OUT, b'B', 102, mem::size_of::<libc::c_uint>());
/// Install a read filter program.
pub(crate) const BIOCSETF: libc::c_ulong = ioc(IOC_IN, b'B', 103, mem::size_of::<bpf_program>());
/// Attach to a named interface.
pub(crate) const BIOCSETIF: libc::c_ulong = ioc(IOC_IN, b'B', 108, mem::size_of::<ifreq>());
/// Return each packet as soon as it arrives instead of waiting for a full buffer.
pub(crate) const BIOCIMMEDIATE: libc::c_ulong = ioc(IOC_IN, b'B', 112, mem::size_of::<libc::c_uint>());

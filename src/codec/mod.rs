//! Wire codecs.
//!
//! This module is responsible for turning raw bytes into typed views and back
//! (SRP): the private wire header, the Ethernet header, and the sequence of
//! capture records returned by one BPF read.

mod bpf_batch;
mod ethernet;
mod wire_header;

pub use bpf_batch::{
    bpf_wordalign, CapturedFrame, CapturedFrames, RecordError, RecordHeader, BPF_ALIGNMENT,
    BPF_HDR_LEN, BPF_HDR_SIZEOF,
};
pub use ethernet::{ethernet_header, from_pnet_mac, to_pnet_mac, ETHERNET_HEADER_SIZE};
pub use wire_header::{Decoded, DropReason, WireHeader, CURRENT_VERSION, MAGIC, WIRE_HEADER_SIZE};

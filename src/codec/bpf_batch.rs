//! Splitting one BPF read into captured frames.
//!
//! A single `read(2)` on a BPF device returns zero or more records laid out
//! back to back:
//!
//! ```text
//! +----------+----------------+---------+----------+----------------+-----
//! | bpf_hdr  | ethernet frame | padding | bpf_hdr  | ethernet frame | ...
//! +----------+----------------+---------+----------+----------------+-----
//! |<- bh_hdrlen ->|<- bh_caplen ->|     ^ next record starts at BPF_WORDALIGN
//! ```
//!
//! The header layout is the Darwin one: a 32-bit timestamp pair, caplen,
//! datalen and hdrlen, all in host byte order.

use macaddr::MacAddr6;
use pnet::packet::ethernet::EthernetPacket;
use pnet::packet::Packet;
use thiserror::Error;

use super::ethernet::from_pnet_mac;
use crate::ETHERTYPE;

/// `BPF_ALIGNMENT` on Darwin: records start on 32-bit boundaries.
pub const BPF_ALIGNMENT: usize = 4;

/// `sizeof(struct bpf_hdr)`, including trailing struct padding. A read
/// shorter than this cannot hold a record.
pub const BPF_HDR_SIZEOF: usize = 20;

/// Bytes of `struct bpf_hdr` that carry fields (`SIZEOF_BPF_HDR`).
pub const BPF_HDR_LEN: usize = 18;

/// Round `len` up to the next record boundary.
pub const fn bpf_wordalign(len: usize) -> usize {
    (len + (BPF_ALIGNMENT - 1)) & !(BPF_ALIGNMENT - 1)
}

/// Capture metadata the kernel places in front of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub tstamp_sec: u32,
    pub tstamp_usec: u32,
    /// Bytes of the frame present in the buffer
    pub caplen: u32,
    /// Length of the frame on the wire
    pub datalen: u32,
    /// Offset from the start of the record to the frame
    pub hdrlen: u16,
}

impl RecordHeader {
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < BPF_HDR_LEN {
            return None;
        }
        let word = |at: usize| u32::from_ne_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);
        Some(Self {
            tstamp_sec: word(0),
            tstamp_usec: word(4),
            caplen: word(8),
            datalen: word(12),
            hdrlen: u16::from_ne_bytes([data[16], data[17]]),
        })
    }

    pub fn to_bytes(&self) -> [u8; BPF_HDR_LEN] {
        let mut out = [0u8; BPF_HDR_LEN];
        out[0..4].copy_from_slice(&self.tstamp_sec.to_ne_bytes());
        out[4..8].copy_from_slice(&self.tstamp_usec.to_ne_bytes());
        out[8..12].copy_from_slice(&self.caplen.to_ne_bytes());
        out[12..16].copy_from_slice(&self.datalen.to_ne_bytes());
        out[16..18].copy_from_slice(&self.hdrlen.to_ne_bytes());
        out
    }

    /// Distance from this record to the next one.
    pub fn stride(&self) -> usize {
        bpf_wordalign(self.hdrlen as usize + self.caplen as usize)
    }
}

/// A record that contradicts the bytes actually read or the installed filter.
///
/// None of these can be caused by a remote peer; they mean the buffer was
/// misparsed or the kernel filter is not doing its job.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("record header at offset {offset} truncated: {available} bytes left")]
    TruncatedHeader { offset: usize, available: usize },

    #[error("record at offset {offset} has header length {hdrlen}")]
    BadHeaderLength { offset: usize, hdrlen: u16 },

    #[error("record at offset {offset} needs {needed} bytes, only {available} read")]
    Overrun {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("record at offset {offset} holds a {caplen} byte frame, too short for Ethernet")]
    ShortFrame { offset: usize, caplen: u32 },

    #[error("record at offset {offset} carries EtherType {ethertype:#06x}")]
    ForeignEtherType { offset: usize, ethertype: u16 },
}

/// One captured Ethernet frame inside the read buffer.
pub struct CapturedFrame<'a> {
    pub offset: usize,
    pub record: RecordHeader,
    ethernet: EthernetPacket<'a>,
}

impl CapturedFrame<'_> {
    pub fn source(&self) -> MacAddr6 {
        from_pnet_mac(self.ethernet.get_source())
    }

    pub fn destination(&self) -> MacAddr6 {
        from_pnet_mac(self.ethernet.get_destination())
    }

    /// Everything after the Ethernet header.
    pub fn payload(&self) -> &[u8] {
        self.ethernet.payload()
    }
}

/// Lazy sequence of the frames in one read buffer.
///
/// Each record is validated before it is yielded. After the first invalid
/// record the sequence ends.
pub struct CapturedFrames<'a> {
    buf: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> CapturedFrames<'a> {
    /// Iterate over the bytes returned by one read.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            offset: 0,
            failed: false,
        }
    }

    fn frame_at(&self, offset: usize) -> Result<CapturedFrame<'a>, RecordError> {
        let rest = &self.buf[offset..];
        let record = RecordHeader::parse(rest).ok_or(RecordError::TruncatedHeader {
            offset,
            available: rest.len(),
        })?;

        let hdrlen = record.hdrlen as usize;
        if hdrlen < BPF_HDR_LEN {
            return Err(RecordError::BadHeaderLength {
                offset,
                hdrlen: record.hdrlen,
            });
        }

        let end = hdrlen + record.caplen as usize;
        if end > rest.len() {
            return Err(RecordError::Overrun {
                offset,
                needed: end,
                available: rest.len(),
            });
        }

        let ethernet = EthernetPacket::new(&rest[hdrlen..end]).ok_or(RecordError::ShortFrame {
            offset,
            caplen: record.caplen,
        })?;

        let ethertype = ethernet.get_ethertype().0;
        if ethertype != ETHERTYPE {
            return Err(RecordError::ForeignEtherType { offset, ethertype });
        }

        Ok(CapturedFrame {
            offset,
            record,
            ethernet,
        })
    }
}

impl<'a> Iterator for CapturedFrames<'a> {
    type Item = Result<CapturedFrame<'a>, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.buf.len() {
            return None;
        }

        let result = self.frame_at(self.offset);
        match &result {
            Ok(frame) => self.offset += frame.record.stride(),
            Err(_) => self.failed = true,
        }
        Some(result)
    }
}

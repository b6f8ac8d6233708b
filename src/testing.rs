//! Test doubles and frame builders shared by the unit tests.

use std::collections::VecDeque;
use std::io;

use macaddr::MacAddr6;

use crate::capture::LinkDevice;
use crate::codec::{bpf_wordalign, ethernet_header, RecordHeader, BPF_HDR_LEN};
use crate::domain::{EthSockaddr, Message, ETH_SOCKADDR_SIZE};
use crate::reporter::MessageSink;

/// Wrap `frame` in a capture record the way the kernel lays it out.
pub fn bpf_record(frame: &[u8]) -> Vec<u8> {
    let header = RecordHeader {
        tstamp_sec: 1_700_000_000,
        tstamp_usec: 0,
        caplen: frame.len() as u32,
        datalen: frame.len() as u32,
        hdrlen: BPF_HDR_LEN as u16,
    };
    let mut record = header.to_bytes().to_vec();
    record.extend_from_slice(frame);
    record.resize(bpf_wordalign(record.len()), 0);
    record
}

/// Build an Ethernet frame carrying this protocol's EtherType.
pub fn eth_frame(destination: MacAddr6, source: MacAddr6, payload: &[u8]) -> Vec<u8> {
    let mut frame = ethernet_header(destination, source).to_vec();
    frame.extend_from_slice(payload);
    frame
}

/// Device that replays scripted reads and records writes.
#[derive(Default)]
pub struct MockDevice {
    reads: VecDeque<io::Result<Vec<u8>>>,
    pub written: Vec<Vec<u8>>,
    /// Accept at most this many bytes per write
    pub write_limit: Option<usize>,
    pub write_would_block: bool,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_read(&mut self, data: Vec<u8>) {
        self.reads.push_back(Ok(data));
    }

    pub fn push_error(&mut self, kind: io::ErrorKind) {
        self.reads.push_back(Err(io::Error::new(kind, "scripted failure")));
    }
}

impl LinkDevice for MockDevice {
    fn read_batch(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reads.pop_front() {
            Some(Ok(data)) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(len)
            }
            Some(Err(e)) => Err(e),
            None => Err(io::ErrorKind::WouldBlock.into()),
        }
    }

    fn write_frame(&mut self, frame: &[u8]) -> io::Result<usize> {
        if self.write_would_block {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        let len = self.write_limit.map_or(frame.len(), |limit| limit.min(frame.len()));
        self.written.push(frame[..len].to_vec());
        Ok(len)
    }
}

/// One message as it reached the sink.
#[derive(Debug, Clone)]
pub struct Delivered {
    pub from: EthSockaddr,
    pub payload: Vec<u8>,
    /// Whether the record started on a 4-byte boundary
    pub aligned: bool,
}

#[derive(Default)]
pub struct CollectingSink {
    pub messages: Vec<Delivered>,
}

impl MessageSink for CollectingSink {
    fn deliver(&mut self, mut msg: Message<'_>) {
        let aligned = msg.is_aligned(4);
        let mut record = [0u8; ETH_SOCKADDR_SIZE];
        msg.pop(&mut record).unwrap();
        self.messages.push(Delivered {
            from: EthSockaddr::from_bytes(&record),
            payload: msg.bytes().to_vec(),
            aligned,
        });
    }
}

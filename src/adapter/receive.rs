//! Receive path: one readable event becomes zero or more upward deliveries.

use std::io;

use tracing::{debug, trace};

use super::{EthInterface, LinkStats};
use crate::capture::LinkDevice;
use crate::codec::{CapturedFrame, CapturedFrames, DropReason, WireHeader, BPF_HDR_SIZEOF};
use crate::domain::{EthSockaddr, ScratchArena};
use crate::reporter::MessageSink;
use crate::MESSAGE_PADDING;

impl<D: LinkDevice, S: MessageSink> EthInterface<D, S> {
    /// Drain one read from the device and deliver every valid message in it.
    ///
    /// Frames that fail validation are logged and dropped. A record that
    /// contradicts the read itself, or a frame the kernel filter should have
    /// rejected, is a broken invariant and panics.
    pub fn handle_readable(&mut self) {
        let span = self.span.clone();
        let _enter = span.enter();
        let Self {
            device,
            read_buf,
            arena,
            sink,
            stats,
            ..
        } = self;

        let len = match device.read_batch(read_buf) {
            Ok(len) => len,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                trace!("eth device not ready");
                return;
            }
            Err(e) => {
                debug!("Error reading from eth device [{}]", e);
                return;
            }
        };
        if len == 0 {
            debug!("empty read from eth device");
            return;
        }
        if len < BPF_HDR_SIZEOF {
            debug!(len, "runt read from eth device");
            return;
        }

        for frame in CapturedFrames::new(&read_buf[..len]) {
            match frame {
                Ok(frame) => deliver_frame(&frame, arena, sink, stats),
                Err(e) => panic!("corrupt capture buffer: {e}"),
            }
        }
    }
}

fn deliver_frame<S: MessageSink>(
    frame: &CapturedFrame<'_>,
    arena: &mut ScratchArena,
    sink: &mut S,
    stats: &mut LinkStats,
) {
    stats.frames_received += 1;

    let decoded = match WireHeader::decode(frame.payload()) {
        Ok(decoded) => decoded,
        Err(reason) => {
            debug!(source = %frame.source(), "DROP {}", reason);
            match reason {
                DropReason::Runt { .. } => stats.dropped_runt += 1,
                DropReason::UnknownVersion(_) => stats.dropped_version += 1,
                DropReason::SizeFieldTooLarge { .. } => stats.dropped_length += 1,
                DropReason::BadMagic(_) => stats.dropped_magic += 1,
            }
            return;
        }
    };
    if decoded.padding > 0 {
        trace!(padding = decoded.padding, "trimmed link padding");
    }

    let from = if frame.destination().as_bytes()[0] == 0xff {
        EthSockaddr {
            mac: frame.source(),
            broadcast: true,
        }
    } else {
        EthSockaddr::unicast(frame.source())
    };

    let mut scope = arena.scope();
    let mut msg = scope.message_from(MESSAGE_PADDING, decoded.content);
    if let Err(e) = msg.push(&from.to_bytes()) {
        panic!("no headroom for the address record: {e}");
    }
    assert!(msg.is_aligned(4), "Alignment fault");

    stats.delivered += 1;
    sink.deliver(msg);
}

//! The Ethernet link adapter.
//!
//! `EthInterface` ties one capture device to one upward [`MessageSink`]. The
//! event loop calls [`EthInterface::handle_readable`] when the device's
//! descriptor becomes readable; the layer above calls
//! [`EthInterface::send`] with messages that start with an address record.

mod receive;

use macaddr::MacAddr6;
use tracing::{debug, info_span, Span};

use crate::capture::LinkDevice;
use crate::codec::{ethernet_header, WireHeader, ETHERNET_HEADER_SIZE, WIRE_HEADER_SIZE};
use crate::domain::{EthSockaddr, Message, ScratchArena, ETH_SOCKADDR_SIZE, SOCKADDR_OVERHEAD};
use crate::error::{MessageError, SendError};
use crate::reporter::MessageSink;
use crate::{MAX_PACKET_SIZE, MESSAGE_PADDING};

/// Headroom an outbound message needs once its address record is popped.
pub const SEND_HEADROOM: usize = ETHERNET_HEADER_SIZE + WIRE_HEADER_SIZE;

/// Counters for traffic through one adapter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Captured frames handed to the decoder
    pub frames_received: u64,
    /// Messages delivered upward
    pub delivered: u64,
    pub dropped_runt: u64,
    pub dropped_version: u64,
    pub dropped_length: u64,
    pub dropped_magic: u64,
    /// Frames written in full
    pub sent: u64,
    /// Writes that failed, would block, or were short
    pub send_failed: u64,
    /// Messages larger than the maximum packet size
    pub send_oversize: u64,
}

/// A link adapter bound to one interface.
pub struct EthInterface<D, S> {
    device: D,
    sink: S,
    if_name: String,
    local_mac: MacAddr6,
    read_buf: Vec<u8>,
    arena: ScratchArena,
    stats: LinkStats,
    span: Span,
}

impl<D: LinkDevice, S: MessageSink> EthInterface<D, S> {
    /// Wrap an already configured device.
    ///
    /// `buffer_len` must be the read size the device requires; the receive
    /// buffer is allocated once with exactly that size.
    pub fn with_device(
        device: D,
        buffer_len: usize,
        if_name: impl Into<String>,
        local_mac: MacAddr6,
        sink: S,
    ) -> Self {
        let if_name = if_name.into();
        let span = info_span!("eth", iface = %if_name);
        Self {
            device,
            sink,
            if_name,
            local_mac,
            read_buf: vec![0; buffer_len],
            arena: ScratchArena::with_capacity(MESSAGE_PADDING + buffer_len),
            stats: LinkStats::default(),
            span,
        }
    }

    /// Frame and transmit a message.
    ///
    /// The message must start with an address record naming the destination.
    /// Malformed messages are rejected with an error. Device trouble is not an
    /// error: the frame is logged, counted, and dropped.
    pub fn send(&mut self, msg: &mut Message<'_>) -> Result<(), SendError> {
        let _enter = self.span.enter();
        transmit(&mut self.device, self.local_mac, &mut self.stats, msg)
    }

    /// Send `payload` to `dest`, building the message in scratch space.
    pub fn send_to(&mut self, dest: EthSockaddr, payload: &[u8]) -> Result<(), SendError> {
        let _enter = self.span.enter();
        let mut scope = self.arena.scope();
        let mut msg = scope.message(SEND_HEADROOM + ETH_SOCKADDR_SIZE, payload.len());
        msg.bytes_mut().copy_from_slice(payload);
        msg.push(&dest.to_bytes())?;
        transmit(&mut self.device, self.local_mac, &mut self.stats, &mut msg)
    }

    pub fn interface_name(&self) -> &str {
        &self.if_name
    }

    pub fn local_mac(&self) -> MacAddr6 {
        self.local_mac
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Size of the receive buffer.
    pub fn buffer_len(&self) -> usize {
        self.read_buf.len()
    }

    /// Peak scratch usage while decoding, in bytes.
    pub fn scratch_high_water(&self) -> usize {
        self.arena.high_water()
    }

    /// The capture device, for registering its descriptor with a reactor.
    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
impl<S: MessageSink> EthInterface<crate::capture::BpfDevice, S> {
    /// Open a BPF device on `if_name` and build an adapter around it.
    ///
    /// Fails if no device frees up within `policy`, if the interface has no
    /// MAC address, or if any configuration step is refused.
    pub fn open(
        if_name: &str,
        sink: S,
        policy: &crate::capture::AcquirePolicy,
    ) -> Result<Self, crate::error::AdapterError> {
        let local_mac = crate::netif::resolve_mac(if_name)?;
        let device = crate::capture::BpfDevice::open(if_name, policy)?;
        let buffer_len = device.buffer_len();
        tracing::info!(interface = if_name, mac = %local_mac, "Ethernet interface ready");
        Ok(Self::with_device(device, buffer_len, if_name, local_mac, sink))
    }
}

/// Pop the address record, prepend both headers, and write the frame.
fn transmit<D: LinkDevice>(
    device: &mut D,
    local_mac: MacAddr6,
    stats: &mut LinkStats,
    msg: &mut Message<'_>,
) -> Result<(), SendError> {
    let addr_len = EthSockaddr::record_len(msg.bytes()).ok_or(
        MessageError::Underflow {
            needed: SOCKADDR_OVERHEAD,
            available: msg.len(),
        },
    )?;
    if (addr_len as usize) < SOCKADDR_OVERHEAD || addr_len as usize > ETH_SOCKADDR_SIZE {
        return Err(SendError::BadAddressLength(addr_len));
    }

    let addr_len = addr_len as usize;

    // The message is left untouched unless every check passes.
    let mut record = [0u8; ETH_SOCKADDR_SIZE];
    record[..addr_len].copy_from_slice(msg.peek(addr_len)?);
    let dest = EthSockaddr::from_bytes(&record);

    let headroom = msg.headroom() + addr_len;
    if headroom < SEND_HEADROOM {
        return Err(MessageError::Headroom {
            needed: SEND_HEADROOM,
            available: headroom,
        }
        .into());
    }
    msg.pop(&mut record[..addr_len])?;
    if msg.len() > MAX_PACKET_SIZE {
        debug!(len = msg.len(), max = MAX_PACKET_SIZE, "DROP oversize message");
        stats.send_oversize += 1;
        return Ok(());
    }

    msg.push(&WireHeader::for_content(msg.len()).to_bytes())?;

    let destination = if dest.broadcast {
        MacAddr6::from([0xff; 6])
    } else {
        dest.mac
    };
    msg.push(&ethernet_header(destination, local_mac))?;

    match device.write_frame(msg.bytes()) {
        Ok(written) if written == msg.len() => stats.sent += 1,
        Ok(written) => {
            debug!(written, len = msg.len(), "Short write to eth device");
            stats.send_failed += 1;
        }
        Err(e) => {
            debug!("Error writing to eth device [{}]", e);
            stats.send_failed += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CURRENT_VERSION, MAGIC};
    use crate::testing::{CollectingSink, MockDevice};
    use crate::ETHERTYPE;

    fn local() -> MacAddr6 {
        MacAddr6::new(0x02, 0x00, 0x00, 0x00, 0x00, 0x01)
    }

    fn peer() -> MacAddr6 {
        MacAddr6::new(0x02, 0x00, 0x00, 0x00, 0x00, 0x02)
    }

    fn adapter(device: MockDevice) -> EthInterface<MockDevice, CollectingSink> {
        EthInterface::with_device(device, 4096, "en0", local(), CollectingSink::default())
    }

    /// Region holding `record ++ payload` with `headroom` spare bytes in front.
    fn outbound(headroom: usize, record: &[u8], payload: &[u8]) -> Vec<u8> {
        let mut region = vec![0u8; headroom];
        region.extend_from_slice(record);
        region.extend_from_slice(payload);
        region
    }

    #[test]
    fn test_send_frames_unicast() {
        let mut eth = adapter(MockDevice::new());
        let payload = b"mesh payload";
        let mut region = outbound(64, &EthSockaddr::unicast(peer()).to_bytes(), payload);
        let mut msg = Message::new(&mut region, 64).unwrap();

        eth.send(&mut msg).unwrap();

        let frames = &eth.device().written;
        assert_eq!(frames.len(), 1);
        let frame = &frames[0];
        assert_eq!(frame.len(), ETHERNET_HEADER_SIZE + WIRE_HEADER_SIZE + payload.len());
        assert_eq!(&frame[0..6], peer().as_bytes());
        assert_eq!(&frame[6..12], local().as_bytes());
        assert_eq!(u16::from_be_bytes([frame[12], frame[13]]), ETHERTYPE);

        let header = WireHeader::parse(&frame[14..]).unwrap();
        assert_eq!(header.version, CURRENT_VERSION);
        assert_eq!(header.zero, 0);
        assert_eq!(header.length as usize, payload.len() + WIRE_HEADER_SIZE);
        assert_eq!(header.magic, MAGIC);
        assert_eq!(&frame[20..], payload);
        assert_eq!(eth.stats().sent, 1);
    }

    #[test]
    fn test_send_broadcast_uses_all_ones_destination() {
        let mut eth = adapter(MockDevice::new());
        eth.send_to(EthSockaddr::broadcast(), b"hello all").unwrap();

        let frame = &eth.device().written[0];
        assert_eq!(&frame[0..6], &[0xff; 6]);
        assert_eq!(&frame[6..12], local().as_bytes());
    }

    #[test]
    fn test_broadcast_flag_overrides_record_mac() {
        let mut eth = adapter(MockDevice::new());
        let dest = EthSockaddr {
            mac: peer(),
            broadcast: true,
        };
        eth.send_to(dest, b"x").unwrap();

        assert_eq!(&eth.device().written[0][0..6], &[0xff; 6]);
    }

    #[test]
    fn test_short_generic_record_is_accepted() {
        // An 8-byte record carries flags but no MAC.
        let mut record = EthSockaddr::broadcast().to_bytes();
        record[0..2].copy_from_slice(&(SOCKADDR_OVERHEAD as u16).to_ne_bytes());
        let mut region = outbound(32, &record[..SOCKADDR_OVERHEAD], b"data");
        let mut msg = Message::new(&mut region, 32).unwrap();

        let mut eth = adapter(MockDevice::new());
        eth.send(&mut msg).unwrap();

        let frame = &eth.device().written[0];
        assert_eq!(&frame[0..6], &[0xff; 6]);
        assert_eq!(&frame[20..], b"data");
    }

    #[test]
    fn test_record_too_long_is_rejected() {
        let mut record = EthSockaddr::unicast(peer()).to_bytes();
        record[0..2].copy_from_slice(&20u16.to_ne_bytes());
        let mut region = outbound(32, &record, b"data....");
        let mut msg = Message::new(&mut region, 32).unwrap();

        let mut eth = adapter(MockDevice::new());
        assert_eq!(eth.send(&mut msg), Err(SendError::BadAddressLength(20)));
        assert!(eth.device().written.is_empty());
    }

    #[test]
    fn test_message_shorter_than_record_is_rejected() {
        let mut region = vec![0u8; 36];
        let mut msg = Message::new(&mut region, 32).unwrap();

        let mut eth = adapter(MockDevice::new());
        assert!(matches!(
            eth.send(&mut msg),
            Err(SendError::Message(MessageError::Underflow { .. }))
        ));
    }

    #[test]
    fn test_missing_headroom_is_rejected() {
        let mut region = outbound(0, &EthSockaddr::unicast(peer()).to_bytes(), b"data");
        let mut msg = Message::new(&mut region, 0).unwrap();

        let before = msg.bytes().to_vec();

        let mut eth = adapter(MockDevice::new());
        assert!(matches!(
            eth.send(&mut msg),
            Err(SendError::Message(MessageError::Headroom {
                needed: 20,
                available: 16
            }))
        ));
        assert_eq!(msg.bytes(), &before[..]);
        assert!(eth.device().written.is_empty());
    }

    #[test]
    fn test_rejected_message_can_be_retried() {
        let record = EthSockaddr::unicast(peer()).to_bytes();
        let mut region = outbound(2, &record, b"data");
        let mut eth = adapter(MockDevice::new());
        {
            let mut msg = Message::new(&mut region, 2).unwrap();
            assert!(eth.send(&mut msg).is_err());
        }

        let mut roomy = outbound(4, &region[2..18], &region[18..]);
        let mut msg = Message::new(&mut roomy, 4).unwrap();
        eth.send(&mut msg).unwrap();
        assert_eq!(&eth.device().written[0][20..], b"data");
    }

    #[test]
    fn test_oversize_message_is_dropped() {
        let mut eth = adapter(MockDevice::new());
        eth.send_to(EthSockaddr::unicast(peer()), &vec![0u8; MAX_PACKET_SIZE + 1])
            .unwrap();

        assert!(eth.device().written.is_empty());
        assert_eq!(eth.stats().send_oversize, 1);

        eth.send_to(EthSockaddr::unicast(peer()), &vec![0u8; MAX_PACKET_SIZE])
            .unwrap();
        assert_eq!(eth.stats().sent, 1);
    }

    #[test]
    fn test_short_write_is_dropped_not_fatal() {
        let mut device = MockDevice::new();
        device.write_limit = Some(10);
        let mut eth = adapter(device);

        assert!(eth.send_to(EthSockaddr::unicast(peer()), b"some payload").is_ok());
        assert_eq!(eth.stats().send_failed, 1);
        assert_eq!(eth.stats().sent, 0);
        assert_eq!(eth.device().written.len(), 1);
    }

    #[test]
    fn test_would_block_is_dropped_not_fatal() {
        let mut device = MockDevice::new();
        device.write_would_block = true;
        let mut eth = adapter(device);

        assert!(eth.send_to(EthSockaddr::unicast(peer()), b"payload").is_ok());
        assert_eq!(eth.stats().send_failed, 1);
        assert!(eth.device().written.is_empty());
    }

    #[test]
    fn test_accessors() {
        let eth = adapter(MockDevice::new());
        assert_eq!(eth.interface_name(), "en0");
        assert_eq!(eth.local_mac(), local());
        assert_eq!(eth.buffer_len(), 4096);
        assert_eq!(eth.stats(), LinkStats::default());
    }
}

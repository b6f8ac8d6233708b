//! Ethernet header encoding.

use macaddr::MacAddr6;
use pnet::packet::ethernet::{EtherType, MutableEthernetPacket};
use pnet::util::MacAddr;

use crate::ETHERTYPE;

/// Size of an Ethernet II header: destination, source, EtherType.
pub const ETHERNET_HEADER_SIZE: usize = 14;

/// Build the Ethernet header for an outbound frame of this protocol.
pub fn ethernet_header(destination: MacAddr6, source: MacAddr6) -> [u8; ETHERNET_HEADER_SIZE] {
    let mut header = [0u8; ETHERNET_HEADER_SIZE];
    if let Some(mut packet) = MutableEthernetPacket::new(&mut header) {
        packet.set_destination(to_pnet_mac(destination));
        packet.set_source(to_pnet_mac(source));
        packet.set_ethertype(EtherType::new(ETHERTYPE));
    }
    header
}

pub fn to_pnet_mac(mac: MacAddr6) -> MacAddr {
    let b = mac.as_bytes();
    MacAddr::new(b[0], b[1], b[2], b[3], b[4], b[5])
}

pub fn from_pnet_mac(mac: MacAddr) -> MacAddr6 {
    MacAddr6::from(mac.octets())
}

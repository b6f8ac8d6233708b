//! Network interface discovery.
//!
//! Lists the interfaces a link adapter can bind to and resolves their MAC
//! addresses. The system table comes from `pnet::datalink`; the
//! `InterfaceTable` trait lets tests substitute their own.

use std::io;

use macaddr::MacAddr6;
use pnet::datalink::{self, NetworkInterface};
use tracing::debug;

use crate::codec::from_pnet_mac;
use crate::error::InterfaceError;

/// Source of interface snapshots.
pub trait InterfaceTable {
    fn interfaces(&self) -> io::Result<Vec<NetworkInterface>>;
}

/// The operating system's interface list.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInterfaces;

impl InterfaceTable for SystemInterfaces {
    fn interfaces(&self) -> io::Result<Vec<NetworkInterface>> {
        Ok(datalink::interfaces())
    }
}

/// Names of interfaces that are up, not loopback, and have a link-layer
/// address, in system order.
pub fn list_devices() -> Result<Vec<String>, InterfaceError> {
    list_devices_in(&SystemInterfaces)
}

/// Resolve the MAC address of `if_name`.
pub fn resolve_mac(if_name: &str) -> Result<MacAddr6, InterfaceError> {
    resolve_mac_in(&SystemInterfaces, if_name)
}

pub fn list_devices_in(table: &impl InterfaceTable) -> Result<Vec<String>, InterfaceError> {
    let names: Vec<String> = table
        .interfaces()
        .map_err(InterfaceError::Enumerate)?
        .into_iter()
        .filter(is_usable)
        .map(|iface| iface.name)
        .collect();
    debug!(count = names.len(), "Enumerated usable interfaces");
    Ok(names)
}

pub fn resolve_mac_in(table: &impl InterfaceTable, if_name: &str) -> Result<MacAddr6, InterfaceError> {
    table
        .interfaces()
        .map_err(InterfaceError::Enumerate)?
        .into_iter()
        .find(|iface| iface.name == if_name && iface.mac.is_some())
        .and_then(|iface| iface.mac)
        .map(from_pnet_mac)
        .ok_or_else(|| InterfaceError::NoMacAddress(if_name.to_string()))
}

fn is_usable(iface: &NetworkInterface) -> bool {
    iface.mac.is_some() && iface.is_up() && !iface.is_loopback()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnet::util::MacAddr;

    const UP: u32 = libc::IFF_UP as u32;
    const LOOPBACK: u32 = libc::IFF_LOOPBACK as u32;

    struct FakeTable(Vec<NetworkInterface>);

    impl InterfaceTable for FakeTable {
        fn interfaces(&self) -> io::Result<Vec<NetworkInterface>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenTable;

    impl InterfaceTable for BrokenTable {
        fn interfaces(&self) -> io::Result<Vec<NetworkInterface>> {
            Err(io::Error::new(io::ErrorKind::Other, "getifaddrs failed"))
        }
    }

    fn iface(name: &str, mac: Option<MacAddr>, flags: u32) -> NetworkInterface {
        NetworkInterface {
            name: name.to_string(),
            description: String::new(),
            index: 0,
            mac,
            ips: Vec::new(),
            flags,
        }
    }

    fn sample_table() -> FakeTable {
        let mac = Some(MacAddr::new(0x02, 0, 0, 0, 0, 0x01));
        FakeTable(vec![
            iface("lo0", Some(MacAddr::zero()), UP | LOOPBACK),
            iface("en0", mac, UP),
            iface("en1", Some(MacAddr::new(0x02, 0, 0, 0, 0, 0x02)), 0),
            iface("utun0", None, UP),
            iface("en2", Some(MacAddr::new(0x02, 0, 0, 0, 0, 0x03)), UP),
        ])
    }

    #[test]
    fn test_lists_usable_interfaces_in_order() {
        let names = list_devices_in(&sample_table()).unwrap();
        assert_eq!(names, vec!["en0".to_string(), "en2".to_string()]);
    }

    #[test]
    fn test_empty_table_is_not_an_error() {
        let names = list_devices_in(&FakeTable(Vec::new())).unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn test_enumeration_failure() {
        assert!(matches!(
            list_devices_in(&BrokenTable),
            Err(InterfaceError::Enumerate(_))
        ));
        assert!(matches!(
            resolve_mac_in(&BrokenTable, "en0"),
            Err(InterfaceError::Enumerate(_))
        ));
    }

    #[test]
    fn test_resolve_mac() {
        let mac = resolve_mac_in(&sample_table(), "en2").unwrap();
        assert_eq!(mac, MacAddr6::new(0x02, 0, 0, 0, 0, 0x03));
    }

    #[test]
    fn test_resolve_ignores_up_state() {
        let mac = resolve_mac_in(&sample_table(), "en1").unwrap();
        assert_eq!(mac, MacAddr6::new(0x02, 0, 0, 0, 0, 0x02));
    }

    #[test]
    fn test_resolve_requires_exact_name() {
        assert!(matches!(
            resolve_mac_in(&sample_table(), "en"),
            Err(InterfaceError::NoMacAddress(name)) if name == "en"
        ));
    }

    #[test]
    fn test_resolve_without_link_layer_address() {
        assert!(matches!(
            resolve_mac_in(&sample_table(), "utun0"),
            Err(InterfaceError::NoMacAddress(_))
        ));
    }
}

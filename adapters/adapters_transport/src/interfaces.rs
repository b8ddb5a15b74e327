//! Interface Enumeration Module
//!
//! Provides local-address enumeration over the host's configured
//! interfaces, and capability probes for the two address families. The
//! enumeration returns one independently owned entry per bindable address
//! with the port unset; callers filter by family when a specific stack is
//! required.

use entities_addressing::{Address, AddressFamily};

use crate::error::SocketError;
use crate::socket::Transport;

/// Enumerate the host's local addresses
///
/// Returns one owned [`Address`] (port 0) per configured interface
/// address, both families mixed. No filtering is applied on the caller's
/// behalf.
#[cfg(unix)]
pub fn local_addresses() -> Result<Vec<Address>, SocketError> {
    use std::net::{IpAddr, Ipv4Addr};

    let interfaces =
        nix::ifaddrs::getifaddrs().map_err(|e| SocketError::IoError(e.to_string()))?;

    let mut addresses = Vec::new();
    for interface in interfaces {
        let Some(storage) = interface.address else {
            continue;
        };
        if let Some(sin) = storage.as_sockaddr_in() {
            addresses.push(Address::new(IpAddr::V4(Ipv4Addr::from(sin.ip())), 0));
        } else if let Some(sin6) = storage.as_sockaddr_in6() {
            addresses.push(Address::new(IpAddr::V6(sin6.ip()), 0));
        }
    }
    Ok(addresses)
}

/// Fallback enumeration for platforms without `getifaddrs`
///
/// Reports only the loopback addresses.
#[cfg(not(unix))]
pub fn local_addresses() -> Result<Vec<Address>, SocketError> {
    Ok(vec![
        Address::loopback(AddressFamily::Ipv4),
        Address::loopback(AddressFamily::Ipv6),
    ])
}

/// Whether the host can open IPv4 sockets
pub fn supports_ipv4() -> bool {
    Transport::Udp.open(AddressFamily::Ipv4).is_ok()
}

/// Whether the host can open IPv6 sockets
pub fn supports_ipv6() -> bool {
    Transport::Udp.open(AddressFamily::Ipv6).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_addresses_ports_are_unset() {
        let addresses = local_addresses().unwrap();
        assert!(!addresses.is_empty());
        for address in &addresses {
            assert_eq!(address.port(), 0);
        }
    }

    #[test]
    fn test_entries_are_independently_owned() {
        let addresses = local_addresses().unwrap();
        let mut first = addresses[0].clone();
        first.set_port(4242);
        // Mutating the clone leaves the enumeration result untouched
        assert_eq!(addresses[0].port(), 0);
    }

    #[test]
    fn test_caller_filters_by_family() {
        if !supports_ipv4() {
            return;
        }
        let v4: Vec<Address> = local_addresses()
            .unwrap()
            .into_iter()
            .filter(|a| a.family() == AddressFamily::Ipv4)
            .collect();
        // A host with IPv4 support has at least the loopback address
        assert!(!v4.is_empty());
    }

    #[test]
    fn test_capability_probes_do_not_panic() {
        let _ = supports_ipv4();
        let _ = supports_ipv6();
    }
}

//! Address Module
//!
//! Provides the endpoint address value type used throughout the network
//! library. An address is a family-tagged IP plus a port; the family is
//! fixed at construction and never changes afterwards.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

/// Address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// IPv4
    Ipv4,
    /// IPv6
    Ipv6,
}

/// Address error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// The input is not a numeric IP address or IP:port endpoint
    InvalidFormat(String),
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressError::InvalidFormat(s) => write!(f, "invalid address format: {}", s),
        }
    }
}

impl std::error::Error for AddressError {}

/// Network endpoint address
///
/// A value type holding a family-tagged IP address and a port. Cloning
/// produces an independently owned value. Equality compares family, IP
/// bytes and port; addresses of different families are never equal, so an
/// IPv4 address and the corresponding IPv4-mapped IPv6 address compare
/// unequal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    ip: IpAddr,
    port: u16,
}

impl Address {
    /// Create an address from an IP and a port
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self { ip, port }
    }

    /// Loopback address for the given family, with port 0
    pub fn loopback(family: AddressFamily) -> Self {
        match family {
            AddressFamily::Ipv4 => Self::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
            AddressFamily::Ipv6 => Self::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 0),
        }
    }

    /// Unspecified (wildcard) address for the given family, with port 0
    pub fn unspecified(family: AddressFamily) -> Self {
        match family {
            AddressFamily::Ipv4 => Self::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            AddressFamily::Ipv6 => Self::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        }
    }

    /// Parse a numeric address string
    ///
    /// Accepts `ip` and `ip:port` forms for IPv4 and `ip` and `[ip]:port`
    /// forms for IPv6. No name resolution is performed; anything that is
    /// not a numeric endpoint fails with [`AddressError::InvalidFormat`].
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        if let Ok(sockaddr) = SocketAddr::from_str(input) {
            return Ok(Self::from(sockaddr));
        }
        if let Ok(ip) = IpAddr::from_str(input) {
            return Ok(Self::new(ip, 0));
        }
        Err(AddressError::InvalidFormat(input.to_string()))
    }

    /// Address family, fixed at construction
    pub fn family(&self) -> AddressFamily {
        match self.ip {
            IpAddr::V4(_) => AddressFamily::Ipv4,
            IpAddr::V6(_) => AddressFamily::Ipv6,
        }
    }

    /// IP component
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /// Port component
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Replace the port in place, leaving family and IP untouched
    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    /// Canonical numeric rendering including the port
    ///
    /// IPv4 renders as `a.b.c.d:port`, IPv6 as `[x:y::z]:port`. The
    /// rendering is deterministic and keeps IPv4-mapped IPv6 addresses in
    /// their colon-hex family form.
    pub fn to_string_with_port(&self) -> String {
        SocketAddr::new(self.ip, self.port).to_string()
    }

    /// Convert to a standard socket address
    pub fn to_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl From<SocketAddr> for Address {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip(), addr.port())
    }
}

impl From<Address> for SocketAddr {
    fn from(addr: Address) -> Self {
        addr.to_socket_addr()
    }
}

impl fmt::Display for Address {
    /// Canonical numeric rendering without the port
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ip)
    }
}

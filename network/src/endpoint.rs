//! Report server endpoint

use core::fmt;

use smoltcp::wire::{IpAddress, IpEndpoint, Ipv4Address};

/// Address the tamper report is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerEndpoint(IpEndpoint);

impl ServerEndpoint {
    /// Default collector (TEST-NET-3, replace per deployment).
    pub const DEFAULT_ADDR: [u8; 4] = [203, 0, 113, 10];

    /// Default collector port.
    pub const DEFAULT_PORT: u16 = 5000;

    pub fn new(endpoint: IpEndpoint) -> Self {
        Self(endpoint)
    }

    /// IPv4 endpoint from octets.
    pub fn v4(octets: [u8; 4], port: u16) -> Self {
        Self(IpEndpoint::new(IpAddress::Ipv4(Ipv4Address(octets)), port))
    }

    pub fn endpoint(&self) -> IpEndpoint {
        self.0
    }

    pub fn port(&self) -> u16 {
        self.0.port
    }

    /// Octets of an IPv4 endpoint, `None` for other families.
    pub fn ipv4_octets(&self) -> Option<[u8; 4]> {
        match self.0.addr {
            IpAddress::Ipv4(addr) => Some(addr.0),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}

impl Default for ServerEndpoint {
    fn default() -> Self {
        Self::v4(Self::DEFAULT_ADDR, Self::DEFAULT_PORT)
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "std")]
impl From<std::net::SocketAddrV4> for ServerEndpoint {
    fn from(addr: std::net::SocketAddrV4) -> Self {
        Self::v4(addr.ip().octets(), addr.port())
    }
}

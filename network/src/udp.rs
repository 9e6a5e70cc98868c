//! Host UDP transport (feature `std`)

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::Duration;

use log::warn;

use crate::endpoint::ServerEndpoint;
use crate::error::{TransportError, TransportResult};
use crate::transport::{DatagramSocket, Transport};

/// [`Transport`] over `std::net::UdpSocket`.
#[derive(Debug, Clone, Copy)]
pub struct UdpTransport {
    bind_addr: SocketAddr,
}

impl UdpTransport {
    /// Bind each socket to an ephemeral port on all interfaces.
    pub fn new() -> Self {
        Self::bind_to(SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)))
    }

    pub fn bind_to(bind_addr: SocketAddr) -> Self {
        Self { bind_addr }
    }
}

impl Default for UdpTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Socket handed out by [`UdpTransport`].
#[derive(Debug)]
pub struct UdpDatagramSocket {
    socket: UdpSocket,
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

impl Transport for UdpTransport {
    type Socket = UdpDatagramSocket;

    fn open_socket(&mut self) -> TransportResult<UdpDatagramSocket> {
        UdpSocket::bind(self.bind_addr)
            .map(|socket| UdpDatagramSocket { socket })
            .map_err(|e| {
                warn!("socket bind to {} failed: {}", self.bind_addr, e);
                TransportError::Socket
            })
    }
}

impl DatagramSocket for UdpDatagramSocket {
    fn set_timeouts(&mut self, timeout_ms: u32) -> TransportResult<()> {
        // A zero duration is rejected by std; treat it as "block forever"
        let timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms as u64));
        self.socket
            .set_read_timeout(timeout)
            .and_then(|_| self.socket.set_write_timeout(timeout))
            .map_err(|e| {
                warn!("setting socket timeouts failed: {}", e);
                TransportError::Unsupported
            })
    }

    fn connect(&mut self, server: &ServerEndpoint) -> TransportResult<()> {
        let octets = server.ipv4_octets().ok_or(TransportError::Unsupported)?;
        let addr = SocketAddrV4::new(Ipv4Addr::from(octets), server.port());
        self.socket.connect(addr).map_err(|e| {
            warn!("connect to {} failed: {}", addr, e);
            TransportError::Connect
        })
    }

    fn send(&mut self, payload: &[u8]) -> TransportResult<usize> {
        self.socket.send(payload).map_err(|e| {
            warn!("send failed: {}", e);
            if is_timeout(&e) {
                TransportError::Timeout
            } else {
                TransportError::Send
            }
        })
    }
}

//! Tamper report collector
//!
//! Binds a UDP socket and decodes every datagram as a tamper report.
//! Anything that is not exactly one report is surfaced as raw bytes.

use std::fmt::{self, Write as _};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use seal_core::{PayloadError, TamperReport};

/// Receive buffer; larger than any report so oversized datagrams are seen whole.
pub const RECV_BUFFER_LEN: usize = 4096;

/// One received datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datagram {
    Report(TamperReport),
    Malformed { bytes: Vec<u8>, error: PayloadError },
}

impl Datagram {
    pub fn parse(bytes: &[u8]) -> Self {
        match TamperReport::decode(bytes) {
            Ok(report) => Self::Report(report),
            Err(error) => Self::Malformed {
                bytes: bytes.to_vec(),
                error,
            },
        }
    }
}

impl fmt::Display for Datagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Report(report) => write!(
                f,
                "device {} status {}",
                hex(&report.device_id.to_bytes()),
                report.status
            ),
            Self::Malformed { bytes, error } => write!(f, "raw {} ({})", hex(bytes), error),
        }
    }
}

/// Lowercase hex without separators.
pub fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

pub struct Receiver {
    socket: UdpSocket,
}

impl Receiver {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        Ok(Self {
            socket: UdpSocket::bind(addr)?,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// `None` blocks forever.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.socket.set_read_timeout(timeout)
    }

    /// Block for the next datagram.
    pub fn recv(&self) -> io::Result<(Datagram, SocketAddr)> {
        let mut buf = [0u8; RECV_BUFFER_LEN];
        let (len, from) = self.socket.recv_from(&mut buf)?;
        Ok((Datagram::parse(&buf[..len]), from))
    }
}

//! Seal Network Layer
//!
//! Ports for delivering the tamper report over the cellular link, plus a
//! `std` UDP transport for bench work.
//!
//! # Usage
//!
//! ```ignore
//! use seal_network::{send_datagram, ServerEndpoint, UdpTransport};
//!
//! let mut transport = UdpTransport::new();
//! let server = ServerEndpoint::v4([127, 0, 0, 1], 5000);
//! send_datagram(&mut transport, &server, &report_bytes, 60_000)?;
//! ```

#![no_std]
#![forbid(unsafe_code)]

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod endpoint;
pub mod error;
pub mod modem;
pub mod transport;

#[cfg(feature = "std")]
pub mod udp;

pub use endpoint::ServerEndpoint;
pub use error::{TransportError, TransportResult};
pub use modem::Modem;
pub use transport::{send_datagram, DatagramSocket, Transport};

#[cfg(feature = "std")]
pub use udp::{UdpDatagramSocket, UdpTransport};

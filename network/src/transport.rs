//! Datagram transport ports
//!
//! The shape follows the BSD socket sequence the modem firmware exposes:
//! create, set timeouts, connect, send. Sockets close when dropped.

use log::{debug, warn};

use crate::endpoint::ServerEndpoint;
use crate::error::{TransportError, TransportResult};

/// One connected datagram socket.
pub trait DatagramSocket {
    /// Apply send and receive timeouts.
    fn set_timeouts(&mut self, timeout_ms: u32) -> TransportResult<()>;

    fn connect(&mut self, server: &ServerEndpoint) -> TransportResult<()>;

    /// Send `payload` as a single datagram. Returns bytes written.
    fn send(&mut self, payload: &[u8]) -> TransportResult<usize>;
}

/// Factory for datagram sockets.
pub trait Transport {
    type Socket: DatagramSocket;

    fn open_socket(&mut self) -> TransportResult<Self::Socket>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Socket = T::Socket;

    fn open_socket(&mut self) -> TransportResult<Self::Socket> {
        (**self).open_socket()
    }
}

/// Run one complete socket/connect/send attempt.
///
/// Timeout configuration failures are logged and ignored; any other
/// failure aborts the attempt. The socket is dropped (closed) on every
/// path.
pub fn send_datagram<T: Transport>(
    transport: &mut T,
    server: &ServerEndpoint,
    payload: &[u8],
    timeout_ms: u32,
) -> TransportResult<()> {
    let mut socket = transport.open_socket()?;

    if let Err(e) = socket.set_timeouts(timeout_ms) {
        warn!("could not set socket timeouts: {}", e);
    }

    socket.connect(server)?;

    let sent = socket.send(payload)?;
    if sent != payload.len() {
        return Err(TransportError::ShortWrite {
            sent,
            expected: payload.len(),
        });
    }

    debug!("sent {} bytes to {}", sent, server);
    Ok(())
}

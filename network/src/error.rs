//! Transport error types

use thiserror::Error;

/// Failure of a network sub-step.
///
/// The transmission engine does not distinguish these for retry purposes;
/// they exist for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Socket could not be created.
    #[error("socket creation failed")]
    Socket,
    /// Connect to the server failed.
    #[error("connect failed")]
    Connect,
    /// Send failed.
    #[error("send failed")]
    Send,
    /// Datagram was only partially written.
    #[error("short write: {sent} of {expected} bytes")]
    ShortWrite { sent: usize, expected: usize },
    /// Send or receive timed out.
    #[error("operation timed out")]
    Timeout,
    /// Modem library or attach request failed.
    #[error("modem initialization failed")]
    ModemInit,
    /// Network registration did not complete in time.
    #[error("network registration timed out after {secs} s")]
    LinkTimeout { secs: u32 },
    /// Endpoint address family not supported by this transport.
    #[error("address family not supported")]
    Unsupported,
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

//! Tamper report wire format
//!
//! Exactly [`REPORT_LEN`] bytes: the 16-byte device identifier followed by
//! a 1-byte status code. No padding, no length prefix, no checksum.

use core::fmt;

use thiserror::Error;
use uguid::Guid;

/// Device identifier length on the wire.
pub const DEVICE_ID_LEN: usize = 16;

/// Encoded report length.
pub const REPORT_LEN: usize = DEVICE_ID_LEN + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("report must be {expected} bytes, got {found}")]
    Length { expected: usize, found: usize },
}

/// Report status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub u8);

impl StatusCode {
    /// Seal opened (light ingress detected).
    pub const OPENED: Self = Self(0x01);

    pub const fn name(self) -> &'static str {
        match self.0 {
            0x01 => "OPENED",
            _ => "UNKNOWN",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02x})", self.name(), self.0)
    }
}

/// Fixed-size tamper report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TamperReport {
    pub device_id: Guid,
    pub status: StatusCode,
}

impl TamperReport {
    pub const fn new(device_id: Guid, status: StatusCode) -> Self {
        Self { device_id, status }
    }

    /// Report for an opened seal.
    pub const fn opened(device_id: Guid) -> Self {
        Self::new(device_id, StatusCode::OPENED)
    }

    pub fn encode(&self) -> [u8; REPORT_LEN] {
        let mut out = [0u8; REPORT_LEN];
        out[..DEVICE_ID_LEN].copy_from_slice(&self.device_id.to_bytes());
        out[DEVICE_ID_LEN] = self.status.0;
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        let bytes: &[u8; REPORT_LEN] = bytes.try_into().map_err(|_| PayloadError::Length {
            expected: REPORT_LEN,
            found: bytes.len(),
        })?;

        let mut id = [0u8; DEVICE_ID_LEN];
        id.copy_from_slice(&bytes[..DEVICE_ID_LEN]);

        Ok(Self {
            device_id: Guid::from_bytes(id),
            status: StatusCode(bytes[DEVICE_ID_LEN]),
        })
    }
}

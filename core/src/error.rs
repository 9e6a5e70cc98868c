//! Error types for the seal core

use seal_network::TransportError;
use seal_persistent::{Flag, StorageError};
use thiserror::Error;

/// Ambient light sensor failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("sensor bus not ready")]
    NotReady,
    #[error("sensor bus transfer failed")]
    Bus,
    #[error("sensor did not respond")]
    NoDevice,
}

/// Power management IC failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PmicError {
    #[error("PMIC bus not ready")]
    NotReady,
    #[error("PMIC bus transfer failed")]
    Bus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WatchdogError {
    #[error("watchdog not available")]
    Unsupported,
    #[error("watchdog setup rejected")]
    Setup,
}

/// Fatal-at-boot conditions. No state progress is possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BootError {
    #[error("durable flag store unavailable: {0}")]
    Storage(#[from] StorageError),
    #[error("sensor bus not ready")]
    SensorBusNotReady,
    #[error("sensor interrupt line not ready")]
    InterruptLineNotReady,
}

/// Recoverable failure of a single state handler.
///
/// The controller stays in the state that failed; the next tick retries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("flag store read failed: {0}")]
    Storage(StorageError),
    #[error("failed to persist {flag} flag: {source}")]
    Persist { flag: Flag, source: StorageError },
    #[error("sensor error: {0}")]
    Sensor(#[from] SensorError),
}

/// Outcome of a transmission run that did not deliver the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransmitError {
    #[error("link bring-up failed: {0}")]
    Link(TransportError),
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u8, last: TransportError },
}

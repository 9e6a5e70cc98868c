//! Seal Core
//!
//! Lifecycle of a tamper-evident security seal: provision, arm in the
//! dark, sleep until light wakes it, then report the tamper exactly once.
//!
//! # Flow
//!
//! ```text
//! boot ─▶ retention check ─▶ flags ─▶ state ─▶ step_once ─┬─▶ Continue(next) ─┐
//!              │                                         │                   │
//!              ▼                                         └─▶ Suspend ─▶ off  │
//!        factory reset ─▶ reboot                              ▲              │
//!                                                            └──────────────┘
//! ```
//!
//! Hardware is reached only through the ports in [`ports`]. Nothing in
//! memory survives a power-off; the persisted flags in `seal_persistent`
//! are the only continuation.
//!
//! # Usage
//!
//! ```ignore
//! use seal_core::{run_firmware, Devices, SealConfig};
//!
//! let devices: Devices<Board> = board::take();
//! let err = run_firmware(devices, SealConfig::default(), &mut board::Power);
//! log::error!("seal halted: {}", err);
//! ```

#![no_std]
#![forbid(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod arming;
pub mod config;
pub mod error;
pub mod keepalive;
pub mod lifecycle;
pub mod payload;
pub mod ports;
pub mod retry;
pub mod state;
pub mod transmit;

pub use arming::{arm, ArmingParams, ArmingReport, DarknessDebounce};
pub use config::SealConfig;
pub use error::{BootError, PmicError, SensorError, StepError, TransmitError, WatchdogError};
pub use keepalive::Keepalive;
pub use lifecycle::{run_firmware, Controller, Startup};
pub use payload::{PayloadError, StatusCode, TamperReport, DEVICE_ID_LEN, REPORT_LEN};
pub use ports::{
    Clock, Devices, Indicator, InterruptLine, LightSensor, Platform, Pmic, PowerControl, Watchdog,
};
pub use retry::{retry, Exhausted, Retried, RetryPolicy};
pub use state::{Halt, LifecycleState, StepResult};
pub use transmit::{bring_up_link, transmit, TransmitParams};

pub use uguid::Guid;

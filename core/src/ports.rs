//! Hardware collaborator ports
//!
//! The controller only talks to hardware through these traits. Board
//! support crates implement them over real drivers; tests implement them
//! over scripted simulations.

use seal_network::{Modem, Transport};
use seal_persistent::{RecordStore, RetentionRegister};

use crate::error::{PmicError, SensorError, WatchdogError};

/// Ambient light sensor on the sensor bus.
pub trait LightSensor {
    /// Whether the bus the sensor sits on is usable.
    fn is_ready(&mut self) -> bool;

    fn init(&mut self) -> Result<(), SensorError>;

    /// Program thresholds and enable the threshold alert.
    fn configure(&mut self) -> Result<(), SensorError>;

    /// One ambient light sample in raw counts.
    fn read_sample(&mut self) -> Result<u16, SensorError>;

    fn shutdown(&mut self) -> Result<(), SensorError>;
}

/// Sensor alert line, doubling as the deep-sleep wake source.
pub trait InterruptLine {
    fn is_ready(&mut self) -> bool;

    /// Current (active-high) level of the line.
    fn is_asserted(&mut self) -> bool;

    /// Configure the line as a level-active wake source for power-off.
    fn enable_wake(&mut self) -> Result<(), SensorError>;
}

/// Status LED used as the visible boot cue.
pub trait Indicator {
    fn is_ready(&mut self) -> bool;

    fn set(&mut self, on: bool);
}

pub trait Pmic {
    fn init(&mut self) -> Result<(), PmicError>;

    /// Switch on the regulated rails used by the sensor and radio.
    fn enable_rails(&mut self) -> Result<(), PmicError>;

    /// Disable regulated rails ahead of power-off.
    fn hibernate(&mut self) -> Result<(), PmicError>;
}

pub trait Watchdog {
    /// Install and start the watchdog with the given timeout.
    fn start(&mut self, timeout_ms: u32) -> Result<(), WatchdogError>;

    fn kick(&mut self);
}

/// Monotonic uptime and blocking delays.
pub trait Clock {
    fn uptime_ms(&self) -> u64;

    fn delay_ms(&self, ms: u32);
}

/// Irreversible exits. Neither call returns.
pub trait PowerControl {
    /// Enter system-off. The next observable event is a fresh boot.
    fn system_off(&mut self) -> !;

    /// Warm reboot (retention register survives).
    fn reboot(&mut self) -> !;
}

/// Binds the collaborator types of one board.
pub trait Platform {
    type Sensor: LightSensor;
    type Interrupt: InterruptLine;
    type Led: Indicator;
    type Pmic: Pmic;
    type Watchdog: Watchdog;
    type Clock: Clock;
    type Store: RecordStore;
    type Retention: RetentionRegister;
    type Modem: Modem;
    type Transport: Transport;
}

/// Owned collaborator instances for one boot.
pub struct Devices<P: Platform> {
    pub sensor: P::Sensor,
    pub interrupt: P::Interrupt,
    pub led: P::Led,
    pub pmic: P::Pmic,
    pub watchdog: P::Watchdog,
    pub clock: P::Clock,
    pub store: P::Store,
    pub retention: P::Retention,
    pub modem: P::Modem,
    pub transport: P::Transport,
}

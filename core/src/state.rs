//! Lifecycle states
//!
//! ```text
//! Boot -> Provisioning -> Arming -> Monitoring -> Triggered -> Transmitting -> Terminated
//!                                      |  ^                                       |  ^
//!                                      +--+ power-off / wake                      +--+ power-off
//! ```

use core::fmt;

use seal_persistent::{Flag, PersistentFlags};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Transient, resolved during initialization.
    Boot,
    Provisioning,
    /// Waiting for sustained darkness.
    Arming,
    /// Armed; sleeps until the tamper line wakes the device.
    Monitoring,
    /// Tamper seen, not yet durable.
    Triggered,
    Transmitting,
    /// Absorbing.
    Terminated,
}

impl LifecycleState {
    /// Most advanced state the persisted flags allow.
    pub const fn from_flags(flags: PersistentFlags) -> Self {
        if flags.contains(Flag::Terminated) {
            Self::Terminated
        } else if flags.contains(Flag::Triggered) {
            Self::Transmitting
        } else if flags.contains(Flag::Provisioned) {
            Self::Monitoring
        } else {
            Self::Provisioning
        }
    }

    /// Boot-time state: [`from_flags`](Self::from_flags), except that an
    /// armed seal woken with the tamper line asserted goes straight to
    /// `Triggered`. The line is only sampled for an armed seal.
    pub fn resolve<F: FnOnce() -> bool>(flags: PersistentFlags, tamper_line: F) -> Self {
        match Self::from_flags(flags) {
            Self::Monitoring if tamper_line() => Self::Triggered,
            state => state,
        }
    }

    /// Whether handlers of this state touch the sensor bus.
    pub const fn requires_sensor(self) -> bool {
        !matches!(self, Self::Terminated)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Boot => "BOOT",
            Self::Provisioning => "PROVISIONING",
            Self::Arming => "ARMING",
            Self::Monitoring => "MONITORING",
            Self::Triggered => "TRIGGERED",
            Self::Transmitting => "TRANSMITTING",
            Self::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a state handler asks the driver to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// Keep running in the given state.
    Continue(LifecycleState),
    /// Power off. Continuation is a fresh boot.
    Suspend,
}

/// Why the driver loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// A handler requested power-off from the given state.
    DeepSleep(LifecycleState),
}

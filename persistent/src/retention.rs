//! Retention flag and the double-reset gesture
//!
//! The retention register survives a warm reset but not a power cycle.
//! Every normal boot writes [`DOUBLE_RESET_MAGIC`] into it; if the next
//! boot still finds the magic, the operator pressed reset twice within the
//! boot window and a factory reset is due.

use log::{debug, warn};

/// Value marking an open double-reset window.
pub const DOUBLE_RESET_MAGIC: u8 = 0xA5;

/// One byte of reset-surviving hardware storage (GPREGRET on nRF).
pub trait RetentionRegister {
    fn read(&mut self) -> u8;
    fn write(&mut self, value: u8);
}

impl<R: RetentionRegister + ?Sized> RetentionRegister for &mut R {
    fn read(&mut self) -> u8 {
        (**self).read()
    }

    fn write(&mut self, value: u8) {
        (**self).write(value)
    }
}

/// Outcome of the boot-time retention check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootKind {
    /// Second boot of a double reset. The gesture has been consumed.
    FactoryReset,
    /// Ordinary boot. The gesture window is now armed.
    Normal,
}

/// Consume or arm the double-reset gesture.
pub fn check_boot<R: RetentionRegister>(reg: &mut R) -> BootKind {
    if reg.read() == DOUBLE_RESET_MAGIC {
        warn!("!!! double reset detected - factory reset !!!");
        reg.write(0);
        BootKind::FactoryReset
    } else {
        reg.write(DOUBLE_RESET_MAGIC);
        BootKind::Normal
    }
}

/// Clear the register before power-off so the next wake is a normal boot.
pub fn disarm<R: RetentionRegister>(reg: &mut R) {
    reg.write(0);
}

/// Time box during which a second reset counts as a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetWindow {
    boot_ms: u64,
    window_ms: u64,
}

impl ResetWindow {
    pub const fn new(boot_ms: u64, window_ms: u64) -> Self {
        Self { boot_ms, window_ms }
    }

    pub const fn boot_ms(&self) -> u64 {
        self.boot_ms
    }

    pub const fn window_ms(&self) -> u64 {
        self.window_ms
    }

    pub const fn elapsed(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.boot_ms)
    }

    /// Whether strictly more than the window has passed since boot.
    pub const fn expired(&self, now_ms: u64) -> bool {
        self.elapsed(now_ms) > self.window_ms
    }

    /// Milliseconds left before deep sleep may be entered.
    pub const fn remaining(&self, now_ms: u64) -> u64 {
        self.window_ms.saturating_sub(self.elapsed(now_ms))
    }

    /// Clear a still-armed gesture once the window has passed.
    ///
    /// Returns `true` if the register was cleared by this call.
    pub fn expire<R: RetentionRegister>(&self, reg: &mut R, now_ms: u64) -> bool {
        if self.expired(now_ms) && reg.read() == DOUBLE_RESET_MAGIC {
            debug!("double-reset window closed after {} ms", self.elapsed(now_ms));
            reg.write(0);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ram::RamRetentionRegister;

    #[test]
    fn test_first_boot_arms_window() {
        let mut reg = RamRetentionRegister::new();
        assert_eq!(check_boot(&mut reg), BootKind::Normal);
        assert_eq!(reg.value(), DOUBLE_RESET_MAGIC);
    }

    #[test]
    fn test_second_boot_consumes_gesture() {
        let mut reg = RamRetentionRegister::new();
        check_boot(&mut reg);
        assert_eq!(check_boot(&mut reg), BootKind::FactoryReset);
        assert_eq!(reg.value(), 0);
        // Gesture is consumed: the boot after the reset is normal again
        assert_eq!(check_boot(&mut reg), BootKind::Normal);
    }

    #[test]
    fn test_window_expiry_clears_register() {
        let mut reg = RamRetentionRegister::with_value(DOUBLE_RESET_MAGIC);
        let window = ResetWindow::new(1_000, 2_000);

        assert!(!window.expire(&mut reg, 3_000));
        assert_eq!(reg.value(), DOUBLE_RESET_MAGIC);

        assert!(window.expire(&mut reg, 3_001));
        assert_eq!(reg.value(), 0);
        assert!(!window.expire(&mut reg, 5_000));
    }

    #[test]
    fn test_remaining() {
        let window = ResetWindow::new(500, 2_000);
        assert_eq!(window.remaining(500), 2_000);
        assert_eq!(window.remaining(1_700), 800);
        assert_eq!(window.remaining(9_000), 0);
        // Clock behind boot stamp never underflows
        assert_eq!(window.remaining(0), 2_000);
    }

    #[test]
    fn test_disarm() {
        let mut reg = RamRetentionRegister::with_value(DOUBLE_RESET_MAGIC);
        disarm(&mut reg);
        assert_eq!(reg.value(), 0);
    }
}

//! Watchdog servicing for long blocking loops

use seal_persistent::{ResetWindow, RetentionRegister};

use crate::error::WatchdogError;
use crate::ports::{Clock, Watchdog};

/// Watchdog that also closes the double-reset window when kicked.
///
/// Arming and transmission can block for minutes; a reset during that time
/// must boot normally rather than be taken for the second half of a
/// double reset.
pub struct Keepalive<'a, W: ?Sized, R: ?Sized, C: ?Sized> {
    watchdog: &'a mut W,
    retention: &'a mut R,
    clock: &'a C,
    window: ResetWindow,
}

impl<'a, W, R, C> Keepalive<'a, W, R, C>
where
    W: Watchdog + ?Sized,
    R: RetentionRegister + ?Sized,
    C: Clock + ?Sized,
{
    pub fn new(watchdog: &'a mut W, retention: &'a mut R, clock: &'a C, window: ResetWindow) -> Self {
        Self {
            watchdog,
            retention,
            clock,
            window,
        }
    }
}

impl<W, R, C> Watchdog for Keepalive<'_, W, R, C>
where
    W: Watchdog + ?Sized,
    R: RetentionRegister + ?Sized,
    C: Clock + ?Sized,
{
    fn start(&mut self, timeout_ms: u32) -> Result<(), WatchdogError> {
        self.watchdog.start(timeout_ms)
    }

    fn kick(&mut self) {
        self.watchdog.kick();
        self.window.expire(&mut self.retention, self.clock.uptime_ms());
    }
}

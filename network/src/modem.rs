//! Cellular modem port

use crate::error::TransportResult;

/// Power and registration control of the wide-area radio.
pub trait Modem {
    /// Initialize the modem library and request network attach.
    ///
    /// Returns as soon as the attach request is accepted; registration
    /// completes asynchronously.
    fn power_on(&mut self) -> TransportResult<()>;

    /// Whether the modem is registered (home or roaming).
    fn is_registered(&mut self) -> bool;

    /// Detach and shut the modem library down. Safe to call when off.
    fn power_off(&mut self);
}

impl<M: Modem + ?Sized> Modem for &mut M {
    fn power_on(&mut self) -> TransportResult<()> {
        (**self).power_on()
    }

    fn is_registered(&mut self) -> bool {
        (**self).is_registered()
    }

    fn power_off(&mut self) {
        (**self).power_off()
    }
}

//! Tamper report transmission
//!
//! Radio bring-up followed by bounded socket attempts. The modem is powered
//! off again whatever the outcome.

use log::{error, info};
use seal_network::{send_datagram, Modem, ServerEndpoint, Transport, TransportError, TransportResult};

use crate::error::TransmitError;
use crate::ports::{Clock, Watchdog};
use crate::retry::{retry, RetryPolicy};

/// Registration poll period.
const LINK_POLL_MS: u32 = 1000;

/// Delivery parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmitParams {
    pub server: ServerEndpoint,
    pub retry: RetryPolicy,
    pub socket_timeout_ms: u32,
    pub link_timeout_secs: u32,
}

/// Power the modem on and wait for network registration.
///
/// Polls once per second for up to `timeout_secs`, servicing the watchdog
/// on every poll. On failure the modem is powered off before returning.
pub fn bring_up_link<M, C, W>(
    modem: &mut M,
    clock: &C,
    watchdog: &mut W,
    timeout_secs: u32,
) -> TransportResult<()>
where
    M: Modem + ?Sized,
    C: Clock + ?Sized,
    W: Watchdog + ?Sized,
{
    if let Err(e) = modem.power_on() {
        error!("modem power-on failed: {}", e);
        modem.power_off();
        return Err(e);
    }
    info!("waiting for network registration");

    let mut waited = 0;
    while !modem.is_registered() {
        if waited >= timeout_secs {
            error!("network registration timed out after {} s", timeout_secs);
            modem.power_off();
            return Err(TransportError::LinkTimeout { secs: timeout_secs });
        }
        watchdog.kick();
        clock.delay_ms(LINK_POLL_MS);
        waited += 1;
    }

    info!("network registered after {} s", waited);
    Ok(())
}

/// Deliver `payload` once.
///
/// Returns the attempt number that succeeded. Retry does not distinguish
/// failure causes.
pub fn transmit<M, T, C, W>(
    modem: &mut M,
    transport: &mut T,
    clock: &C,
    watchdog: &mut W,
    params: &TransmitParams,
    payload: &[u8],
) -> Result<u8, TransmitError>
where
    M: Modem + ?Sized,
    T: Transport,
    C: Clock + ?Sized,
    W: Watchdog + ?Sized,
{
    bring_up_link(modem, clock, watchdog, params.link_timeout_secs).map_err(TransmitError::Link)?;

    let result = retry(&params.retry, clock, watchdog, |attempt| {
        info!("sending report to {} (attempt {})", params.server, attempt);
        send_datagram(&mut *transport, &params.server, payload, params.socket_timeout_ms)
    });

    modem.power_off();

    match result {
        Ok(done) => {
            info!("payload sent on attempt {}", done.attempts);
            Ok(done.attempts)
        }
        Err(exhausted) => {
            error!(
                "transmission failed after {} attempts: {}",
                exhausted.attempts, exhausted.last
            );
            Err(TransmitError::Exhausted {
                attempts: exhausted.attempts,
                last: exhausted.last,
            })
        }
    }
}

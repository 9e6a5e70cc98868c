//! Bounded retry with fixed backoff

use core::fmt::Display;

use log::warn;

use crate::ports::{Clock, Watchdog};

/// Attempt budget and pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves as one.
    pub attempts: u8,
    /// Pause after a failed attempt when another one follows.
    pub backoff_ms: u32,
}

impl RetryPolicy {
    pub const fn new(attempts: u8, backoff_ms: u32) -> Self {
        Self {
            attempts,
            backoff_ms,
        }
    }

    /// Report delivery: 3 attempts, 60 s apart.
    pub const fn transmission() -> Self {
        Self::new(3, 60_000)
    }

    const fn budget(&self) -> u8 {
        if self.attempts == 0 {
            1
        } else {
            self.attempts
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::transmission()
    }
}

/// Successful value and the attempt (1-based) that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: u8,
}

/// Last error after the budget ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exhausted<E> {
    pub last: E,
    pub attempts: u8,
}

/// Run `op` until it succeeds or the policy's budget is spent.
///
/// `op` receives the 1-based attempt number. Between attempts the watchdog
/// is serviced and the clock sleeps `backoff_ms`; there is no pause after
/// the final attempt.
pub fn retry<T, E, C, W, F>(
    policy: &RetryPolicy,
    clock: &C,
    watchdog: &mut W,
    mut op: F,
) -> Result<Retried<T>, Exhausted<E>>
where
    E: Display,
    C: Clock + ?Sized,
    W: Watchdog + ?Sized,
    F: FnMut(u8) -> Result<T, E>,
{
    let budget = policy.budget();
    let mut attempt = 1;

    loop {
        match op(attempt) {
            Ok(value) => {
                return Ok(Retried {
                    value,
                    attempts: attempt,
                })
            }
            Err(e) if attempt >= budget => {
                return Err(Exhausted {
                    last: e,
                    attempts: attempt,
                })
            }
            Err(e) => {
                warn!(
                    "attempt {}/{} failed: {}; retrying in {} ms",
                    attempt, budget, e, policy.backoff_ms
                );
                watchdog.kick();
                clock.delay_ms(policy.backoff_ms);
                attempt += 1;
            }
        }
    }
}

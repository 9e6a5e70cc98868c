//! Arming debounce
//!
//! The seal arms once the sensor has reported darkness for a run of
//! consecutive samples. Any light sample restarts the run. Read errors
//! neither extend nor break it.

use log::{debug, info, warn};

use crate::ports::{Clock, LightSensor, Watchdog};

/// Consecutive-darkness counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DarknessDebounce {
    threshold: u16,
    target: u32,
    consecutive: u32,
}

impl DarknessDebounce {
    /// `threshold` in raw counts (dark is strictly below), `target` in samples.
    pub const fn new(threshold: u16, target: u32) -> Self {
        Self {
            threshold,
            target,
            consecutive: 0,
        }
    }

    /// Feed one sample. Returns `true` once armed.
    pub fn observe(&mut self, counts: u16) -> bool {
        if counts < self.threshold {
            self.consecutive = self.consecutive.saturating_add(1);
            debug!("darkness {}/{} (counts={})", self.consecutive, self.target, counts);
        } else {
            if self.consecutive > 0 {
                info!("light detected (counts={}), arming timer reset", counts);
            }
            self.consecutive = 0;
        }
        self.is_armed()
    }

    pub const fn consecutive(&self) -> u32 {
        self.consecutive
    }

    pub const fn target(&self) -> u32 {
        self.target
    }

    pub const fn is_armed(&self) -> bool {
        self.consecutive >= self.target
    }
}

/// Parameters of one blocking arming run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmingParams {
    pub dark_threshold: u16,
    pub target_samples: u32,
    pub sample_interval_ms: u32,
    pub read_retry_delay_ms: u32,
}

/// What an arming run went through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArmingReport {
    /// Successful reads.
    pub samples: u32,
    pub read_errors: u32,
}

/// Block until the sensor has been dark for `target_samples` consecutive
/// samples.
///
/// There is no upper bound on the wait. The watchdog is serviced once per
/// iteration, including iterations whose read failed.
pub fn arm<S, C, W>(sensor: &mut S, clock: &C, watchdog: &mut W, params: &ArmingParams) -> ArmingReport
where
    S: LightSensor + ?Sized,
    C: Clock + ?Sized,
    W: Watchdog + ?Sized,
{
    info!(
        "arming: waiting for {} s of darkness (< {} counts)",
        params.target_samples, params.dark_threshold
    );

    if let Err(e) = sensor.configure() {
        warn!("sensor configure failed before arming: {}", e);
    }

    let mut debounce = DarknessDebounce::new(params.dark_threshold, params.target_samples);
    let mut report = ArmingReport::default();

    while !debounce.is_armed() {
        match sensor.read_sample() {
            Ok(counts) => {
                report.samples += 1;
                let armed = debounce.observe(counts);
                watchdog.kick();
                if armed {
                    break;
                }
                clock.delay_ms(params.sample_interval_ms);
            }
            Err(e) => {
                report.read_errors += 1;
                warn!("sensor read failed: {}", e);
                watchdog.kick();
                clock.delay_ms(params.read_retry_delay_ms);
            }
        }
    }

    info!(
        "arming complete after {} samples ({} read errors)",
        report.samples, report.read_errors
    );
    report
}

//! Lifecycle controller
//!
//! Owns the volatile [`LifecycleState`] and runs one handler per
//! [`Controller::step_once`]. Power-off is returned to the caller as
//! [`StepResult::Suspend`]; nothing in memory survives it, and the next
//! boot rebuilds the state from the persisted flags alone.
//!
//! # Boot sequence
//! 1. Boot blink, PMIC rails and watchdog (failures logged)
//! 2. Retention register: second boot of a double reset wipes the flags
//! 3. Mount the flag store and resolve the state from the flags
//! 4. Sensor bus and interrupt line checks (not needed when terminated)
//! 5. Tamper wake override: monitoring with the line asserted is triggered

use log::{error, info, warn};
use seal_persistent::{check_boot, disarm, BootKind, Flag, FlagStore, ResetWindow};

use crate::arming::{arm, ArmingParams};
use crate::config::SealConfig;
use crate::error::{BootError, StepError};
use crate::keepalive::Keepalive;
use crate::payload::TamperReport;
use crate::ports::{Clock, Devices, Indicator, InterruptLine, LightSensor, Platform, Pmic, PowerControl, Watchdog};
use crate::state::{Halt, LifecycleState, StepResult};
use crate::transmit::{transmit, TransmitParams};

/// Result of a successful initialization.
pub enum Startup<P: Platform> {
    /// Normal boot; the controller is ready to run.
    Ready(Controller<P>),
    /// Double reset consumed and flags wiped. The caller must reboot.
    FactoryReset(Devices<P>),
}

/// The seal's state machine.
pub struct Controller<P: Platform> {
    devices: Devices<P>,
    config: SealConfig,
    state: LifecycleState,
    window: ResetWindow,
}

impl<P: Platform> Controller<P> {
    /// Reconstruct the lifecycle state for this boot.
    ///
    /// A flag record that cannot be read (mount failure or a record of the
    /// wrong size) is fatal rather than read as "no flags". A triggered seal
    /// therefore never re-arms from a damaged record, at the cost of not
    /// booting at all until a double-reset factory reset clears it.
    pub fn initialize(mut devices: Devices<P>, config: SealConfig) -> Result<Startup<P>, BootError> {
        power_up(&mut devices, &config);

        if let BootKind::FactoryReset = check_boot(&mut devices.retention) {
            factory_reset(&mut devices, &config);
            return Ok(Startup::FactoryReset(devices));
        }

        let window = ResetWindow::new(devices.clock.uptime_ms(), config.boot_window_ms as u64);

        let flags = FlagStore::open(&mut devices.store)
            .and_then(|mut store| store.get_flags())
            .map_err(|e| {
                error!("flag store unavailable: {}", e);
                BootError::Storage(e)
            })?;

        let stored = LifecycleState::from_flags(flags);
        info!("flags {} -> {}", flags, stored);

        if stored.requires_sensor() {
            if !devices.sensor.is_ready() {
                error!("sensor bus not ready");
                return Err(BootError::SensorBusNotReady);
            }
            if !devices.interrupt.is_ready() {
                error!("sensor interrupt line not ready");
                return Err(BootError::InterruptLineNotReady);
            }
            if let Err(e) = devices.sensor.init() {
                warn!("sensor init failed: {}", e);
            }
        }

        let state = LifecycleState::resolve(flags, || devices.interrupt.is_asserted());
        if state != stored {
            info!("woken by tamper line");
        }

        info!("init complete, state {}", state);
        Ok(Startup::Ready(Self {
            devices,
            config,
            state,
            window,
        }))
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn config(&self) -> &SealConfig {
        &self.config
    }

    pub fn reset_window(&self) -> ResetWindow {
        self.window
    }

    pub fn devices(&self) -> &Devices<P> {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut Devices<P> {
        &mut self.devices
    }

    /// Give the collaborators back, e.g. to hand them to the next boot.
    pub fn into_devices(self) -> Devices<P> {
        self.devices
    }

    /// Run the handler of the current state once.
    ///
    /// On error the state is left unchanged.
    pub fn step_once(&mut self) -> Result<StepResult, StepError> {
        let now = self.devices.clock.uptime_ms();
        self.window.expire(&mut self.devices.retention, now);

        info!("state: {}", self.state);
        let result = match self.state {
            LifecycleState::Boot => {
                let flags = FlagStore::new(&mut self.devices.store)
                    .get_flags()
                    .map_err(StepError::Storage)?;
                StepResult::Continue(LifecycleState::resolve(flags, || {
                    self.devices.interrupt.is_asserted()
                }))
            }
            // Pairing and activation would go here.
            LifecycleState::Provisioning => StepResult::Continue(LifecycleState::Arming),
            LifecycleState::Arming => self.handle_arming()?,
            LifecycleState::Monitoring => self.handle_monitoring()?,
            LifecycleState::Triggered => {
                self.persist(Flag::Triggered)?;
                StepResult::Continue(LifecycleState::Transmitting)
            }
            LifecycleState::Transmitting => self.handle_transmitting(),
            LifecycleState::Terminated => self.handle_terminated(),
        };

        if let StepResult::Continue(next) = result {
            self.state = next;
        }
        Ok(result)
    }

    /// Drive the state machine until a handler asks for power-off.
    ///
    /// Each tick services the watchdog, runs one step and sleeps `tick_ms`.
    /// Step errors are logged and the failing state is retried next tick.
    pub fn run_until_halt(&mut self) -> Halt {
        loop {
            self.devices.watchdog.kick();

            match self.step_once() {
                Ok(StepResult::Suspend) => return Halt::DeepSleep(self.state),
                Ok(StepResult::Continue(_)) => {}
                Err(e) => error!("{} handler failed: {}", self.state, e),
            }

            self.devices.clock.delay_ms(self.config.tick_ms);
        }
    }

    /// Firmware main loop. Never returns.
    pub fn run<X: PowerControl + ?Sized>(mut self, power: &mut X) -> ! {
        let Halt::DeepSleep(state) = self.run_until_halt();
        info!("system off from {}", state);
        power.system_off()
    }

    fn persist(&mut self, flag: Flag) -> Result<(), StepError> {
        FlagStore::new(&mut self.devices.store)
            .set_flag(flag)
            .map(|_| ())
            .map_err(|source| {
                error!("failed to persist {}: {}", flag, source);
                StepError::Persist { flag, source }
            })
    }

    fn handle_arming(&mut self) -> Result<StepResult, StepError> {
        let params = ArmingParams {
            dark_threshold: self.config.dark_threshold,
            target_samples: self.config.arming_secs,
            sample_interval_ms: self.config.sample_interval_ms,
            read_retry_delay_ms: self.config.read_retry_delay_ms,
        };

        let Devices {
            sensor,
            watchdog,
            retention,
            clock,
            ..
        } = &mut self.devices;
        let mut keepalive = Keepalive::new(watchdog, retention, &*clock, self.window);
        arm(sensor, &*clock, &mut keepalive, &params);

        info!("arming complete, locking device");
        self.persist(Flag::Provisioned)?;
        Ok(StepResult::Continue(LifecycleState::Monitoring))
    }

    fn handle_monitoring(&mut self) -> Result<StepResult, StepError> {
        self.devices.sensor.configure()?;
        self.devices.interrupt.enable_wake()?;

        info!("entering system off");
        self.prepare_sleep();
        Ok(StepResult::Suspend)
    }

    fn handle_transmitting(&mut self) -> StepResult {
        let payload = TamperReport::opened(self.config.device_id).encode();
        let params = TransmitParams {
            server: self.config.server,
            retry: self.config.tx_retry,
            socket_timeout_ms: self.config.socket_timeout_ms,
            link_timeout_secs: self.config.link_timeout_secs,
        };

        let Devices {
            modem,
            transport,
            watchdog,
            retention,
            clock,
            ..
        } = &mut self.devices;
        let mut keepalive = Keepalive::new(watchdog, retention, &*clock, self.window);
        if let Err(e) = transmit(modem, transport, &*clock, &mut keepalive, &params, &payload) {
            error!("report not delivered: {}", e);
        }

        // Terminal either way; a failed write only costs a repeat send next boot.
        if let Err(e) = self.persist(Flag::Terminated) {
            warn!("terminating without durable flag: {}", e);
        }
        StepResult::Continue(LifecycleState::Terminated)
    }

    fn handle_terminated(&mut self) -> StepResult {
        if let Err(e) = self.devices.sensor.shutdown() {
            warn!("sensor shutdown failed: {}", e);
        }
        if let Err(e) = self.devices.pmic.hibernate() {
            warn!("PMIC hibernate failed: {}", e);
        }

        self.prepare_sleep();
        StepResult::Suspend
    }

    /// Hold until the double-reset window has passed, then clear the gesture.
    fn prepare_sleep(&mut self) {
        let remaining = self.window.remaining(self.devices.clock.uptime_ms());
        if remaining > 0 {
            info!("holding {} ms for double-reset window", remaining);
            self.devices
                .clock
                .delay_ms(u32::try_from(remaining).unwrap_or(u32::MAX));
        }

        disarm(&mut self.devices.retention);
        self.devices.clock.delay_ms(self.config.sleep_settle_ms);
    }
}

/// Boot the seal and run it until power-off.
///
/// Returns only when initialization fails; the device then stays up and
/// unresponsive until it is physically reset.
pub fn run_firmware<P, X>(devices: Devices<P>, config: SealConfig, power: &mut X) -> BootError
where
    P: Platform,
    X: PowerControl + ?Sized,
{
    info!("security seal booting");
    match Controller::initialize(devices, config) {
        Ok(Startup::Ready(controller)) => controller.run(power),
        Ok(Startup::FactoryReset(_)) => {
            info!("rebooting after factory reset");
            power.reboot()
        }
        Err(e) => {
            error!("init failed: {}", e);
            e
        }
    }
}

fn power_up<P: Platform>(devices: &mut Devices<P>, config: &SealConfig) {
    blink_boot(devices, config);

    let pmic = &mut devices.pmic;
    if let Err(e) = pmic.init().and_then(|()| pmic.enable_rails()) {
        error!("PMIC init failed, power rails may be down: {}", e);
    }

    if let Err(e) = devices.watchdog.start(config.watchdog_timeout_ms) {
        error!("watchdog init failed: {}", e);
    }
}

fn blink_boot<P: Platform>(devices: &mut Devices<P>, config: &SealConfig) {
    if !devices.led.is_ready() {
        error!("LED device not ready");
        return;
    }

    for _ in 0..config.boot_blinks {
        devices.led.set(true);
        devices.clock.delay_ms(config.blink_ms);
        devices.led.set(false);
        devices.clock.delay_ms(config.blink_ms);
    }
}

fn factory_reset<P: Platform>(devices: &mut Devices<P>, config: &SealConfig) {
    match FlagStore::open(&mut devices.store).and_then(|mut store| store.reset()) {
        Ok(()) => info!("factory reset complete"),
        Err(e) => error!("factory reset failed: {}", e),
    }
    devices.clock.delay_ms(config.factory_reset_delay_ms);
}

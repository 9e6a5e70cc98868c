//! Host simulation of the seal's collaborators.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use seal_core::{
    Clock, Devices, Indicator, InterruptLine, LightSensor, Platform, Pmic, PmicError, PowerControl,
    SensorError, Watchdog, WatchdogError,
};
use seal_network::{DatagramSocket, Modem, ServerEndpoint, Transport, TransportError, TransportResult};
use seal_persistent::{Flag, FlagStore, RamRecordStore, RamRetentionRegister};

pub struct Sim;

impl Platform for Sim {
    type Sensor = SimSensor;
    type Interrupt = SimLine;
    type Led = SimLed;
    type Pmic = SimPmic;
    type Watchdog = SimWatchdog;
    type Clock = SimClock;
    type Store = RamRecordStore;
    type Retention = RamRetentionRegister;
    type Modem = SimModem;
    type Transport = SimTransport;
}

/// Uptime that only moves when something sleeps.
#[derive(Default)]
pub struct SimClock {
    now: Cell<u64>,
    pub delays: RefCell<Vec<u32>>,
}

impl SimClock {
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn count_delays(&self, ms: u32) -> usize {
        self.delays.borrow().iter().filter(|&&d| d == ms).count()
    }
}

impl Clock for SimClock {
    fn uptime_ms(&self) -> u64 {
        self.now.get()
    }

    fn delay_ms(&self, ms: u32) {
        self.advance(ms as u64);
        self.delays.borrow_mut().push(ms);
    }
}

/// Light sensor replaying a script, then reporting `fallback`.
pub struct SimSensor {
    pub ready: bool,
    pub script: VecDeque<Result<u16, SensorError>>,
    pub fallback: u16,
    pub fail_configure: bool,
    pub reads: u32,
    pub configured: u32,
    pub initialized: u32,
    pub shutdowns: u32,
}

impl SimSensor {
    pub fn dark() -> Self {
        Self {
            ready: true,
            script: VecDeque::new(),
            fallback: 0,
            fail_configure: false,
            reads: 0,
            configured: 0,
            initialized: 0,
            shutdowns: 0,
        }
    }

    pub fn scripted<I: IntoIterator<Item = Result<u16, SensorError>>>(samples: I) -> Self {
        Self {
            script: samples.into_iter().collect(),
            ..Self::dark()
        }
    }
}

impl LightSensor for SimSensor {
    fn is_ready(&mut self) -> bool {
        self.ready
    }

    fn init(&mut self) -> Result<(), SensorError> {
        self.initialized += 1;
        Ok(())
    }

    fn configure(&mut self) -> Result<(), SensorError> {
        self.configured += 1;
        if self.fail_configure {
            Err(SensorError::Bus)
        } else {
            Ok(())
        }
    }

    fn read_sample(&mut self) -> Result<u16, SensorError> {
        self.reads += 1;
        self.script.pop_front().unwrap_or(Ok(self.fallback))
    }

    fn shutdown(&mut self) -> Result<(), SensorError> {
        self.shutdowns += 1;
        Ok(())
    }
}

pub struct SimLine {
    pub ready: bool,
    pub asserted: bool,
    pub wake_enabled: bool,
}

impl InterruptLine for SimLine {
    fn is_ready(&mut self) -> bool {
        self.ready
    }

    fn is_asserted(&mut self) -> bool {
        self.asserted
    }

    fn enable_wake(&mut self) -> Result<(), SensorError> {
        self.wake_enabled = true;
        Ok(())
    }
}

/// Delays the default boot blink adds before anything else runs.
pub const BOOT_BLINK_DELAYS: usize = 6;

/// LED recording every level change.
pub struct SimLed {
    pub ready: bool,
    pub on: bool,
    pub changes: Vec<bool>,
}

impl Default for SimLed {
    fn default() -> Self {
        Self {
            ready: true,
            on: false,
            changes: Vec::new(),
        }
    }
}

impl Indicator for SimLed {
    fn is_ready(&mut self) -> bool {
        self.ready
    }

    fn set(&mut self, on: bool) {
        self.on = on;
        self.changes.push(on);
    }
}

#[derive(Default)]
pub struct SimPmic {
    pub fail_init: bool,
    pub rails_on: bool,
    pub hibernated: bool,
}

impl Pmic for SimPmic {
    fn init(&mut self) -> Result<(), PmicError> {
        if self.fail_init {
            Err(PmicError::NotReady)
        } else {
            Ok(())
        }
    }

    fn enable_rails(&mut self) -> Result<(), PmicError> {
        self.rails_on = true;
        Ok(())
    }

    fn hibernate(&mut self) -> Result<(), PmicError> {
        self.rails_on = false;
        self.hibernated = true;
        Ok(())
    }
}

#[derive(Default)]
pub struct SimWatchdog {
    pub timeout_ms: Option<u32>,
    pub kicks: u32,
}

impl Watchdog for SimWatchdog {
    fn start(&mut self, timeout_ms: u32) -> Result<(), WatchdogError> {
        self.timeout_ms = Some(timeout_ms);
        Ok(())
    }

    fn kick(&mut self) {
        self.kicks += 1;
    }
}

/// Modem that registers after `register_after` polls (`None`: never).
pub struct SimModem {
    pub register_after: Option<u32>,
    pub fail_power_on: bool,
    pub polls: u32,
    pub on: bool,
    pub power_ons: u32,
    pub power_offs: u32,
}

impl Default for SimModem {
    fn default() -> Self {
        Self {
            register_after: Some(0),
            fail_power_on: false,
            polls: 0,
            on: false,
            power_ons: 0,
            power_offs: 0,
        }
    }
}

impl Modem for SimModem {
    fn power_on(&mut self) -> TransportResult<()> {
        self.power_ons += 1;
        if self.fail_power_on {
            return Err(TransportError::ModemInit);
        }
        self.on = true;
        Ok(())
    }

    fn is_registered(&mut self) -> bool {
        let polls = self.polls;
        self.polls += 1;
        self.on && self.register_after.is_some_and(|n| polls >= n)
    }

    fn power_off(&mut self) {
        self.on = false;
        self.power_offs += 1;
    }
}

#[derive(Default)]
pub struct NetLog {
    pub sockets: u32,
    pub timeouts: Vec<u32>,
    pub connected: Vec<ServerEndpoint>,
    pub sent: Vec<Vec<u8>>,
}

/// Transport whose attempts follow `outcomes`; attempts past the end succeed.
#[derive(Default)]
pub struct SimTransport {
    pub outcomes: VecDeque<Result<(), TransportError>>,
    pub log: Rc<RefCell<NetLog>>,
}

impl SimTransport {
    pub fn failing(times: usize) -> Self {
        Self {
            outcomes: std::iter::repeat(Err(TransportError::Send)).take(times).collect(),
            ..Self::default()
        }
    }
}

pub struct SimSocket {
    outcome: Result<(), TransportError>,
    log: Rc<RefCell<NetLog>>,
}

impl Transport for SimTransport {
    type Socket = SimSocket;

    fn open_socket(&mut self) -> TransportResult<SimSocket> {
        let outcome = self.outcomes.pop_front().unwrap_or(Ok(()));
        if outcome == Err(TransportError::Socket) {
            return Err(TransportError::Socket);
        }
        self.log.borrow_mut().sockets += 1;
        Ok(SimSocket {
            outcome,
            log: self.log.clone(),
        })
    }
}

impl DatagramSocket for SimSocket {
    fn set_timeouts(&mut self, timeout_ms: u32) -> TransportResult<()> {
        self.log.borrow_mut().timeouts.push(timeout_ms);
        Ok(())
    }

    fn connect(&mut self, server: &ServerEndpoint) -> TransportResult<()> {
        if self.outcome == Err(TransportError::Connect) {
            return Err(TransportError::Connect);
        }
        self.log.borrow_mut().connected.push(*server);
        Ok(())
    }

    fn send(&mut self, payload: &[u8]) -> TransportResult<usize> {
        self.outcome?;
        self.log.borrow_mut().sent.push(payload.to_vec());
        Ok(payload.len())
    }
}

/// Panics with the requested exit, so tests can observe `-> !` calls.
pub struct PanicPower;

impl PowerControl for PanicPower {
    fn system_off(&mut self) -> ! {
        panic!("system off");
    }

    fn reboot(&mut self) -> ! {
        panic!("reboot");
    }
}

/// Fresh board with a dark sensor and a blank store.
pub fn devices() -> Devices<Sim> {
    Devices {
        sensor: SimSensor::dark(),
        interrupt: SimLine {
            ready: true,
            asserted: false,
            wake_enabled: false,
        },
        led: SimLed::default(),
        pmic: SimPmic::default(),
        watchdog: SimWatchdog::default(),
        clock: SimClock::default(),
        store: RamRecordStore::new(),
        retention: RamRetentionRegister::new(),
        modem: SimModem::default(),
        transport: SimTransport::default(),
    }
}

/// Board whose store already holds `flags`.
pub fn devices_with_flags(flags: &[Flag]) -> Devices<Sim> {
    let devices = devices();
    let mut store = FlagStore::open(&devices.store).unwrap();
    for &flag in flags {
        store.set_flag(flag).unwrap();
    }
    devices.store.unmount();
    devices
}

/// Warm reset: uptime restarts, storage remounts, retention survives.
pub fn warm_reset(mut devices: Devices<Sim>) -> Devices<Sim> {
    devices.clock = SimClock::default();
    devices.store.unmount();
    devices.interrupt.wake_enabled = false;
    devices.modem = SimModem::default();
    devices
}

/// Power loss: like a warm reset, but the retention register is lost too.
pub fn power_cycle(devices: Devices<Sim>) -> Devices<Sim> {
    let devices = warm_reset(devices);
    devices.retention.power_loss();
    devices
}

pub fn stored_flags(devices: &Devices<Sim>) -> seal_persistent::PersistentFlags {
    FlagStore::open(&devices.store).unwrap().get_flags().unwrap()
}

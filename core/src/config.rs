//! Seal configuration

use seal_network::ServerEndpoint;
use uguid::Guid;

use crate::retry::RetryPolicy;

/// Timings, thresholds and identity of one seal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealConfig {
    /// Identifier carried in the tamper report.
    pub device_id: Guid,
    /// Report collector.
    pub server: ServerEndpoint,
    /// Samples strictly below this count are dark.
    pub dark_threshold: u16,
    /// Consecutive dark samples required to arm.
    pub arming_secs: u32,
    /// Pause between arming samples (ms).
    pub sample_interval_ms: u32,
    /// Pause after a failed sensor read (ms).
    pub read_retry_delay_ms: u32,
    /// Minimum uptime before power-off; double-reset gesture window (ms).
    pub boot_window_ms: u32,
    /// Report delivery attempts and backoff.
    pub tx_retry: RetryPolicy,
    /// Per-attempt socket send/receive timeout (ms).
    pub socket_timeout_ms: u32,
    /// Network registration wait (s).
    pub link_timeout_secs: u32,
    /// Pause between wiping the flag store and rebooting (ms).
    pub factory_reset_delay_ms: u32,
    /// Pause between clearing the retention register and power-off (ms).
    pub sleep_settle_ms: u32,
    pub watchdog_timeout_ms: u32,
    /// LED blinks at every boot, so an operator can time a double reset.
    pub boot_blinks: u8,
    /// LED on and off time of one boot blink (ms).
    pub blink_ms: u32,
    /// Driver loop period (ms).
    pub tick_ms: u32,
}

impl Default for SealConfig {
    fn default() -> Self {
        Self {
            device_id: Guid::ZERO,
            server: ServerEndpoint::default(),
            dark_threshold: 5,
            arming_secs: 120,
            sample_interval_ms: 1000,
            read_retry_delay_ms: 1000,
            boot_window_ms: 2000,
            tx_retry: RetryPolicy::transmission(),
            socket_timeout_ms: 60_000,
            link_timeout_secs: 300,
            factory_reset_delay_ms: 1000,
            sleep_settle_ms: 100,
            watchdog_timeout_ms: 180_000,
            boot_blinks: 3,
            blink_ms: 200,
            tick_ms: 1000,
        }
    }
}

impl SealConfig {
    /// Shortened timings for bench bring-up.
    pub fn bench() -> Self {
        Self {
            arming_secs: 10,
            tx_retry: RetryPolicy::new(3, 5_000),
            socket_timeout_ms: 10_000,
            link_timeout_secs: 60,
            watchdog_timeout_ms: 30_000,
            ..Self::default()
        }
    }

    pub fn with_device_id(mut self, device_id: Guid) -> Self {
        self.device_id = device_id;
        self
    }

    pub fn with_server(mut self, server: ServerEndpoint) -> Self {
        self.server = server;
        self
    }

    /// Darkness threshold (counts) and required consecutive dark samples.
    pub fn arming(mut self, dark_threshold: u16, arming_secs: u32) -> Self {
        self.dark_threshold = dark_threshold;
        self.arming_secs = arming_secs;
        self
    }

    pub fn tx_retry(mut self, policy: RetryPolicy) -> Self {
        self.tx_retry = policy;
        self
    }

    pub fn boot_window(mut self, boot_window_ms: u32) -> Self {
        self.boot_window_ms = boot_window_ms;
        self
    }
}

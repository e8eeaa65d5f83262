//! Lock configuration parameters
//!
//! All tunable parameters for both controllers.  Defaults reproduce the
//! deployed system: one tick per second, a 15 s unlock, 3 s hold, 15 s
//! lock, and a one-minute alarm after three consecutive failures.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::credential::CREDENTIAL_LEN;
use crate::error::ConfigError;

/// Size of the credential store address space (24C16: 11 address bits).
pub const STORE_CAPACITY: u16 = 0x0800;

/// Core lock configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    // --- Credential store ---
    /// First address of the credential region in the store
    pub credential_base_addr: u16,

    // --- Fault handling ---
    /// Consecutive mismatches that trigger the alarm / lockout screen
    pub max_consecutive_faults: u8,

    // --- Timing ---
    /// Period of the actuation timer callback (milliseconds)
    pub tick_interval_ms: u32,
    /// Ticks spent driving the bolt open
    pub unlock_ticks: u32,
    /// Ticks the door is held open with the motor stopped
    pub hold_ticks: u32,
    /// Ticks spent driving the bolt closed
    pub lock_ticks: u32,
    /// Ticks the alarm indicator stays active
    pub alarm_ticks: u32,
    /// Ticks the front controller shows its lockout error screen
    pub lockout_ticks: u32,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            // Store
            credential_base_addr: 0x0311,

            // Faults
            max_consecutive_faults: 3,

            // Timing
            tick_interval_ms: 1000, // 1 Hz
            unlock_ticks: 15,
            hold_ticks: 3,
            lock_ticks: 15,
            alarm_ticks: 60,
            lockout_ticks: 60,
        }
    }
}

impl LockConfig {
    /// Total length of the unlock → hold → lock sequence.
    pub fn actuation_ticks(&self) -> u32 {
        self.unlock_ticks + self.hold_ticks + self.lock_ticks
    }

    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let end = u32::from(self.credential_base_addr) + CREDENTIAL_LEN as u32;
        if end > u32::from(STORE_CAPACITY) {
            return Err(ConfigError::Invalid(
                "credential_base_addr must leave room for the credential below 0x0800",
            ));
        }
        if !(1..=9).contains(&self.max_consecutive_faults) {
            return Err(ConfigError::Invalid("max_consecutive_faults must be 1..=9"));
        }
        if !(1..=10_000).contains(&self.tick_interval_ms) {
            return Err(ConfigError::Invalid("tick_interval_ms must be 1..=10000"));
        }
        if self.unlock_ticks == 0 || self.hold_ticks == 0 || self.lock_ticks == 0 {
            return Err(ConfigError::Invalid(
                "unlock_ticks, hold_ticks and lock_ticks must be non-zero",
            ));
        }
        if self.actuation_ticks() > 3600 {
            return Err(ConfigError::Invalid("actuation sequence must fit in 3600 ticks"));
        }
        if !(1..=3600).contains(&self.alarm_ticks) {
            return Err(ConfigError::Invalid("alarm_ticks must be 1..=3600"));
        }
        if !(1..=3600).contains(&self.lockout_ticks) {
            return Err(ConfigError::Invalid("lockout_ticks must be 1..=3600"));
        }
        Ok(())
    }

    /// Load a JSON config file.  Missing fields take their defaults; the
    /// result is validated before it is returned.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path.as_ref()).map_err(|_| ConfigError::Io)?;
        let cfg: Self =
            serde_json::from_reader(BufReader::new(file)).map_err(|_| ConfigError::Parse)?;
        cfg.validate()?;
        log::info!("config: loaded {}", path.as_ref().display());
        Ok(cfg)
    }
}

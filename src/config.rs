//! Poller configuration.
//!
//! Every section has serde defaults, so an empty file (or no file at all) gives
//! the stock behaviour: a 16 ms tick, four XInput slots with a 12000 stick
//! deadzone, and HID thresholds of 24000 / 42000.
//!
//! ```toml
//! tick_interval_ms = 16
//!
//! [slots]
//! slot_count = 4
//! stick_deadzone = 12000
//!
//! [device]
//! low_threshold = 24000
//! high_threshold = 42000
//!
//! [device.buttons]
//! a = 1
//! b = 2
//! back = 8
//! start = 9
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Interval between polls when driven by [`PollDriver`](crate::driver::PollDriver).
    pub tick_interval_ms: u64,
    pub slots: SlotConfig,
    pub device: DeviceConfig,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 16,
            slots: SlotConfig::default(),
            device: DeviceConfig::default(),
        }
    }
}

/// Most slots a slot-based backend exposes (XInput's four user indices).
pub const MAX_SLOTS: u32 = 4;

/// Slot-based (XInput) backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    /// Number of slots scanned, starting at 0.
    pub slot_count: u32,
    /// Stick magnitude that must be exceeded before a direction counts as pushed.
    pub stick_deadzone: i16,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            slot_count: 4,
            stick_deadzone: 12000,
        }
    }
}

/// Enumeration-based (HID) backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Axis values strictly below this count as left/up.
    pub low_threshold: u16,
    /// Axis values strictly above this count as right/down.
    pub high_threshold: u16,
    /// Input buffer size requested on acquisition.
    pub buffer_size: usize,
    pub buttons: ButtonMap,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            low_threshold: 24000,
            high_threshold: 42000,
            buffer_size: 128,
            buttons: ButtonMap::default(),
        }
    }
}

/// Which joystick button positions act as the logical navigation buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonMap {
    pub a: usize,
    pub b: usize,
    pub back: usize,
    pub start: usize,
}

impl Default for ButtonMap {
    fn default() -> Self {
        Self {
            a: 1,
            b: 2,
            back: 8,
            start: 9,
        }
    }
}

impl InputConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from disk. `.json` files are parsed as JSON, anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_toml_str(&text)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be > 0".into()));
        }
        if !(1..=MAX_SLOTS).contains(&self.slots.slot_count) {
            return Err(ConfigError::Invalid(format!(
                "slots.slot_count must be in 1..={MAX_SLOTS}, got {}",
                self.slots.slot_count
            )));
        }
        if self.slots.stick_deadzone <= 0 {
            return Err(ConfigError::Invalid(
                "slots.stick_deadzone must be > 0".into(),
            ));
        }
        if self.device.low_threshold >= self.device.high_threshold {
            return Err(ConfigError::Invalid(format!(
                "device.low_threshold ({}) must be below device.high_threshold ({})",
                self.device.low_threshold, self.device.high_threshold
            )));
        }
        if self.device.buffer_size == 0 {
            return Err(ConfigError::Invalid("device.buffer_size must be > 0".into()));
        }
        Ok(())
    }

    #[inline]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

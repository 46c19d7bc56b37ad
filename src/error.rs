//! Error types.
//!
//! [`DeviceError`] never leaves a backend's `poll`: every variant downgrades the
//! backend to disconnected and is only logged. [`ConfigError`] is returned
//! from config loading, the one fallible public API.

use thiserror::Error;

/// Failures while talking to a device-access collaborator.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The platform enumeration call itself failed.
    #[error("device enumeration failed: {0}")]
    Enumeration(String),

    /// Enumeration succeeded but nothing of a usable class is attached.
    #[error("no controller attached")]
    NoDevice,

    /// A device was found but a read handle could not be obtained.
    #[error("failed to acquire {device}: {reason}")]
    Acquisition { device: String, reason: String },

    /// The device errored mid-read.
    #[error("read failed: {0}")]
    Read(String),

    /// The device reported that it went away.
    #[error("device disconnected")]
    Disconnected,
}

/// Failures while loading an [`InputConfig`](crate::config::InputConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

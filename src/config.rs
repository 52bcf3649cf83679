//! # Configuration
//!
//! JSON configuration for the meter and its serial port:
//!
//! ```json
//! {
//!   "key": "00 11 22 33 44 55 66 77 88 99 AA BB CC DD EE FF",
//!   "idle_timeout_ms": 100,
//!   "serial": { "port": "/dev/ttyUSB0", "baudrate": 115200, "poll_interval_ms": 16 }
//! }
//! ```
//!
//! Only `key` and `serial.port` are required.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_BAUDRATE, DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS};
use crate::crypto::{AesKey, KeyError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid key: {0}")]
    Key(#[from] KeyError),

    #[error("idle timeout must be greater than zero")]
    ZeroIdleTimeout,
}

/// Configuration for serial connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConfig {
    pub port: String,
    #[serde(default = "default_baudrate")]
    pub baudrate: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl SerialConfig {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baudrate: DEFAULT_BAUDRATE,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeterConfig {
    /// 16-byte key as 32 hex digits; whitespace is ignored.
    pub key: String,
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
    pub serial: Option<SerialConfig>,
}

fn default_baudrate() -> u32 {
    DEFAULT_BAUDRATE
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_idle_timeout_ms() -> u64 {
    DEFAULT_IDLE_TIMEOUT_MS
}

impl MeterConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            serial: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: MeterConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Check the key and timeout without building a meter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.aes_key()?;
        if self.idle_timeout_ms == 0 {
            return Err(ConfigError::ZeroIdleTimeout);
        }
        Ok(())
    }

    pub fn aes_key(&self) -> Result<AesKey, ConfigError> {
        Ok(AesKey::from_hex(&self.key)?)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

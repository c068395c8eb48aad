//! Configuration file structures for fuelbox.
//!
//! This module defines the TOML layout loaded at startup:
//! - [`RuntimeConfig`]: Top-level configuration file structure
//! - [`HostConfig`]: Fuel charged by host calls

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::EngineConfig;

/// Top-level runtime configuration.
///
/// # Example
///
/// ```toml
/// [engine]
/// consume_fuel = true
/// backtrace_details = true
///
/// [host]
/// log_base_fuel = 10
/// log_fuel_per_byte = 1
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuntimeConfig {
    /// Engine-wide switches, frozen when the engine is built.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Host call fuel costs.
    #[serde(default)]
    pub host: HostConfig,
}

impl RuntimeConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        let config = Self::from_toml(&content)?;
        debug!(
            path = %path.display(),
            consume_fuel = config.engine.consume_fuel(),
            backtrace_details = config.engine.backtrace_details(),
            "Runtime configuration loaded"
        );
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigFileError> {
        toml::from_str(content).map_err(|e| ConfigFileError::Parse {
            message: e.to_string(),
        })
    }
}

/// Fuel charged by host functions when fuel consumption is enabled.
///
/// Host calls run outside the metered guest code, so without an explicit
/// charge a guest could do unbounded work by looping over host calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct HostConfig {
    /// Flat fuel charged per `env.log` call.
    #[serde(default = "defaults::log_base_fuel")]
    pub log_base_fuel: u64,

    /// Additional fuel charged per message byte of `env.log`.
    #[serde(default = "defaults::log_fuel_per_byte")]
    pub log_fuel_per_byte: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_base_fuel: defaults::log_base_fuel(),
            log_fuel_per_byte: defaults::log_fuel_per_byte(),
        }
    }
}

impl HostConfig {
    /// Fuel charged for logging a message of `len` bytes.
    pub fn log_cost(&self, len: u64) -> u64 {
        self.log_base_fuel
            .saturating_add(len.saturating_mul(self.log_fuel_per_byte))
    }
}

/// Configuration file errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("Failed to parse config file: {message}")]
    Parse { message: String },
}

mod defaults {
    pub const fn log_base_fuel() -> u64 {
        10
    }

    pub const fn log_fuel_per_byte() -> u64 {
        1
    }
}

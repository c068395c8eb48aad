//! Engine-wide configuration.
//!
//! [`EngineConfig`] holds the switches that must be fixed before any module
//! is compiled or run. It is a plain `Copy` value: there are no setters that
//! mutate in place, only `with_*` transitions that return a new value with a
//! single field replaced. An engine built from a configuration keeps its own
//! copy, so later transitions never reach an existing engine.

use serde::{Deserialize, Serialize};

/// Wasmtime engine configuration.
///
/// # Example
///
/// ```
/// use fuelbox_common::EngineConfig;
///
/// let base = EngineConfig::default();
/// let metered = base.with_consume_fuel(true).with_backtrace_details(true);
///
/// assert!(!base.consume_fuel());
/// assert!(metered.consume_fuel());
/// assert!(metered.backtrace_details());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Meter execution with fuel; stores must be funded before running code.
    #[serde(default)]
    consume_fuel: bool,

    /// Parse debug information so traps carry function names and source
    /// locations.
    #[serde(default)]
    backtrace_details: bool,

    /// Pre-allocate instance slots instead of mapping memory on demand.
    #[serde(default)]
    pooling_allocator: bool,

    /// Maximum concurrent instances in the pool.
    ///
    /// Only effective when `pooling_allocator` is enabled.
    #[serde(default = "defaults::max_instances")]
    max_instances: u32,

    /// Memory per instance slot in megabytes.
    #[serde(default = "defaults::instance_memory_mb")]
    instance_memory_mb: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            consume_fuel: false,
            backtrace_details: false,
            pooling_allocator: false,
            max_instances: defaults::max_instances(),
            instance_memory_mb: defaults::instance_memory_mb(),
        }
    }
}

impl EngineConfig {
    /// Return a copy with fuel consumption switched on or off.
    #[must_use]
    pub const fn with_consume_fuel(self, enabled: bool) -> Self {
        Self {
            consume_fuel: enabled,
            ..self
        }
    }

    /// Return a copy with backtrace symbolication switched on or off.
    #[must_use]
    pub const fn with_backtrace_details(self, enabled: bool) -> Self {
        Self {
            backtrace_details: enabled,
            ..self
        }
    }

    /// Return a copy with the pooling allocator switched on or off.
    #[must_use]
    pub const fn with_pooling_allocator(self, enabled: bool) -> Self {
        Self {
            pooling_allocator: enabled,
            ..self
        }
    }

    /// Return a copy with a different pool size.
    #[must_use]
    pub const fn with_max_instances(self, max_instances: u32) -> Self {
        Self {
            max_instances,
            ..self
        }
    }

    /// Return a copy with a different per-instance memory size.
    #[must_use]
    pub const fn with_instance_memory_mb(self, instance_memory_mb: u32) -> Self {
        Self {
            instance_memory_mb,
            ..self
        }
    }

    /// Whether execution is metered with fuel.
    pub const fn consume_fuel(&self) -> bool {
        self.consume_fuel
    }

    /// Whether traps carry function names and source locations.
    pub const fn backtrace_details(&self) -> bool {
        self.backtrace_details
    }

    /// Whether instances come from a pre-allocated pool.
    pub const fn pooling_allocator(&self) -> bool {
        self.pooling_allocator
    }

    /// Maximum concurrent instances in the pool.
    pub const fn max_instances(&self) -> u32 {
        self.max_instances
    }

    /// Memory per instance slot in megabytes.
    pub const fn instance_memory_mb(&self) -> u32 {
        self.instance_memory_mb
    }
}

/// Default value functions for serde.
mod defaults {
    pub const fn max_instances() -> u32 {
        1000
    }

    pub const fn instance_memory_mb() -> u32 {
        64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<EngineConfig> {
        let base = EngineConfig::default();
        vec![
            base,
            base.with_consume_fuel(true),
            base.with_backtrace_details(true),
            base.with_consume_fuel(true).with_backtrace_details(true),
            base.with_pooling_allocator(true)
                .with_max_instances(7)
                .with_instance_memory_mb(3),
        ]
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();

        assert!(!config.consume_fuel());
        assert!(!config.backtrace_details());
        assert!(!config.pooling_allocator());
        assert_eq!(config.max_instances(), 1000);
        assert_eq!(config.instance_memory_mb(), 64);
    }

    #[test]
    fn test_consume_fuel_replaces_only_that_field() {
        for config in samples() {
            for enabled in [false, true] {
                let before = config;
                let updated = config.with_consume_fuel(enabled);

                assert_eq!(updated.consume_fuel(), enabled);
                assert_eq!(updated.backtrace_details(), config.backtrace_details());
                assert_eq!(updated.pooling_allocator(), config.pooling_allocator());
                assert_eq!(updated.max_instances(), config.max_instances());
                assert_eq!(updated.instance_memory_mb(), config.instance_memory_mb());
                assert_eq!(config, before);
            }
        }
    }

    #[test]
    fn test_backtrace_details_replaces_only_that_field() {
        for config in samples() {
            for enabled in [false, true] {
                let updated = config.with_backtrace_details(enabled);

                assert_eq!(updated.backtrace_details(), enabled);
                assert_eq!(updated.consume_fuel(), config.consume_fuel());
                assert_eq!(updated, config.with_backtrace_details(enabled));
            }
        }
    }

    #[test]
    fn test_transitions_are_idempotent() {
        for config in samples() {
            for enabled in [false, true] {
                let once = config.with_consume_fuel(enabled);
                assert_eq!(once.with_consume_fuel(enabled), once);

                let once = config.with_backtrace_details(enabled);
                assert_eq!(once.with_backtrace_details(enabled), once);
            }
        }
    }

    #[test]
    fn test_flags_are_independent() {
        for config in samples() {
            assert_eq!(
                config.with_consume_fuel(true).backtrace_details(),
                config.backtrace_details()
            );
            assert_eq!(
                config.with_backtrace_details(true).consume_fuel(),
                config.consume_fuel()
            );
        }
    }

    #[test]
    fn test_config_serialization() {
        let config = EngineConfig::default()
            .with_consume_fuel(true)
            .with_max_instances(12);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: EngineConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_deserialization() {
        let json = r#"{"backtrace_details": true}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();

        // Explicitly set value
        assert!(config.backtrace_details());
        // Default values for unspecified fields
        assert!(!config.consume_fuel());
        assert_eq!(config.max_instances(), 1000);
    }
}

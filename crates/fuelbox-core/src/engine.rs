//! Wasmtime engine construction.
//!
//! The [`WasmEngine`] is built once from an [`EngineConfig`] and keeps its
//! own copy of it. Fuel metering and backtrace symbolication are compiled
//! into every module the engine produces, so neither can change afterwards.

use std::sync::Arc;

use tracing::info;
use wasmtime::{
    Config, Engine, InstanceAllocationStrategy, PoolingAllocationConfig, WasmBacktraceDetails,
};

use fuelbox_common::{EngineConfig, RuntimeError};

/// Thread-safe WebAssembly engine wrapper.
///
/// Cloning is cheap and every clone shares the same compiled-code cache and
/// the same frozen configuration.
///
/// # Example
///
/// ```ignore
/// use fuelbox_common::EngineConfig;
/// use fuelbox_core::WasmEngine;
///
/// let config = EngineConfig::default().with_consume_fuel(true);
/// let engine = WasmEngine::new(&config)?;
/// assert!(engine.consume_fuel());
/// ```
#[derive(Clone)]
pub struct WasmEngine {
    engine: Arc<Engine>,
    config: EngineConfig,
}

impl WasmEngine {
    /// Create a new WebAssembly engine with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The Wasmtime configuration is invalid
    /// - The pooling allocator cannot be initialized
    pub fn new(config: &EngineConfig) -> Result<Self, RuntimeError> {
        let config = *config;
        let mut wasmtime_config = Config::new();

        // Host functions and entry points are driven through `call_async`
        wasmtime_config.async_support(true);

        wasmtime_config.consume_fuel(config.consume_fuel());

        // Raw frames are always captured; only symbolication is optional
        wasmtime_config.wasm_backtrace(true);
        wasmtime_config.wasm_backtrace_details(if config.backtrace_details() {
            WasmBacktraceDetails::Enable
        } else {
            WasmBacktraceDetails::Disable
        });

        wasmtime_config.cranelift_opt_level(wasmtime::OptLevel::Speed);

        if config.pooling_allocator() {
            wasmtime_config.allocation_strategy(InstanceAllocationStrategy::Pooling(
                Self::create_pooling_config(&config),
            ));

            info!(
                max_instances = config.max_instances(),
                instance_memory_mb = config.instance_memory_mb(),
                "Pooling allocator enabled"
            );
        }

        let engine = Engine::new(&wasmtime_config).map_err(|e| {
            RuntimeError::invalid_config(format!("Failed to create Wasmtime engine: {e}"))
        })?;

        info!(
            consume_fuel = config.consume_fuel(),
            backtrace_details = config.backtrace_details(),
            "Wasmtime engine initialized"
        );

        Ok(Self {
            engine: Arc::new(engine),
            config,
        })
    }

    fn create_pooling_config(config: &EngineConfig) -> PoolingAllocationConfig {
        let mut pooling = PoolingAllocationConfig::default();

        pooling.total_core_instances(config.max_instances());
        pooling.total_memories(config.max_instances());
        pooling.total_tables(config.max_instances());

        let max_memory_bytes = (config.instance_memory_mb() as usize) * 1024 * 1024;
        pooling.max_memory_size(max_memory_bytes);

        pooling
    }

    /// Get a reference to the inner Wasmtime engine.
    pub fn inner(&self) -> &Engine {
        &self.engine
    }

    /// The configuration this engine was built from.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether stores of this engine are fuel-metered.
    pub fn consume_fuel(&self) -> bool {
        self.config.consume_fuel()
    }

    /// Whether traps from this engine carry names and source locations.
    pub fn backtrace_details(&self) -> bool {
        self.config.backtrace_details()
    }
}

impl std::fmt::Debug for WasmEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmEngine")
            .field("consume_fuel", &self.config.consume_fuel())
            .field("backtrace_details", &self.config.backtrace_details())
            .field("pooling_allocator", &self.config.pooling_allocator())
            .finish_non_exhaustive()
    }
}

//! fuelbox: fuel-metered WebAssembly execution on Wasmtime.
//!
//! Build an [`EngineConfig`], hand it to [`WasmEngine::new`], fund each store
//! with [`add_fuel`] when fuel consumption is on, and run code through an
//! [`InstanceRunner`]. Traps come back as [`TrapReport`]s whose frames are
//! symbolicated when `backtrace_details` is on.
//!
//! ```ignore
//! use fuelbox::{EngineConfig, HostConfig, InstanceRunner, WasmEngine};
//!
//! let config = EngineConfig::default().with_consume_fuel(true);
//! let engine = WasmEngine::new(&config)?;
//! let mut runner = InstanceRunner::new(&engine);
//! fuelbox::host::register_all(runner.linker_mut())?;
//!
//! let mut store = fuelbox::create_store(&engine, &HostConfig::default());
//! fuelbox::add_fuel(&mut store, 10_000)?;
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use fuelbox_common::{
    ConfigFileError, EngineConfig, FrameSymbol, HostConfig, RuntimeConfig, RuntimeError,
    TrapCause, TrapFrame, TrapReport,
};
pub use fuelbox_core::{
    CompiledModule, ExecutionMetrics, ExecutionResult, InstanceRunner, SharedStore, StoreContext,
    WasmEngine, add_fuel, create_store, fuel_balance,
};
pub use fuelbox_host as host;

/// Install a global `tracing` subscriber.
///
/// Honors `RUST_LOG`, falling back to `info,fuelbox=debug`. Returns `false`
/// if a subscriber was already installed.
pub fn init_tracing() -> bool {
    let installed = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fuelbox=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Tracing initialized");
    }
    installed
}

//! Fuel-metered Wasmtime runtime for fuelbox.
//!
//! This crate turns an [`EngineConfig`](fuelbox_common::EngineConfig) into
//! running code:
//! - [`WasmEngine`]: Engine built once from a frozen configuration
//! - [`CompiledModule`]: Compiled WebAssembly module wrapper
//! - [`StoreContext`]: Per-store state; fuel balance helpers in [`store`]
//! - [`InstanceRunner`]: Execution with trap classification and backtraces
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     EngineConfig                        │
//! │  (Copy value, changed only by with_* transitions)       │
//! └─────────────────────────────────────────────────────────┘
//!                            │ copied once
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                     WasmEngine                          │
//! │  - consume_fuel: fuel checks compiled into code         │
//! │  - backtrace_details: debug info parsed at compile time │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │            Store<StoreContext> + Instance               │
//! │  - Fuel balance, starts at zero                         │
//! │  - Traps reported as TrapReport                         │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod backtrace;
pub mod engine;
pub mod instance;
pub mod module;
pub mod store;

pub use engine::WasmEngine;
pub use instance::{ExecutionResult, InstanceRunner};
pub use module::CompiledModule;
pub use store::{
    ExecutionMetrics, LogEntry, LogLevel, SharedStore, StoreContext, add_fuel, create_store,
    fuel_balance,
};

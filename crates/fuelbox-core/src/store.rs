//! Per-store execution context and fuel balance management.
//!
//! This module provides:
//! - [`StoreContext`]: Per-store state accessible from host functions
//! - [`LogEntry`] and [`LogLevel`]: Structured logging from guest code
//! - [`ExecutionMetrics`]: Fuel and timing of the last execution
//! - Fuel balance operations: [`add_fuel`], [`fuel_balance`]
//! - [`SharedStore`]: A store that several tasks can execute against
//!
//! Every store starts with a balance of zero, whether or not the engine
//! meters fuel. On a metered engine the caller must fund the store before
//! any code runs.
//!
//! Wasmtime frees instances only when their store is dropped, so each store
//! instantiates a given module once and later executions reuse that
//! instance. Guest globals and memory therefore persist across executions on
//! the same store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;
use wasmtime::{Instance, Store};

use crate::WasmEngine;
use fuelbox_common::{HostConfig, RuntimeError};

/// Per-store execution context.
///
/// Host functions reach this through [`wasmtime::Caller::data`].
pub struct StoreContext {
    /// Unique store identifier for tracing.
    pub store_id: String,

    /// Logs collected from guest code during the most recent execution.
    pub logs: Vec<LogEntry>,

    /// Metrics of the most recent execution.
    pub metrics: ExecutionMetrics,

    /// Fuel charged by host calls.
    pub host: HostConfig,

    /// Instances already created in this store, keyed by module content hash.
    instances: HashMap<String, Instance>,
}

/// A single log entry from guest code.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: Instant,
}

/// Log level for guest logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Execution metrics.
#[derive(Debug, Clone, Default)]
pub struct ExecutionMetrics {
    /// Fuel consumed by the most recent execution, including a trapped one.
    pub fuel_consumed: u64,

    /// Wall-clock duration of the most recent execution.
    pub duration: Option<Duration>,
}

impl StoreContext {
    /// Create a new context with a fresh store id.
    pub fn new(host: HostConfig) -> Self {
        Self {
            store_id: Uuid::new_v4().to_string(),
            logs: Vec::new(),
            metrics: ExecutionMetrics::default(),
            host,
            instances: HashMap::new(),
        }
    }

    /// Number of module instances living in this store.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Remove and return the collected guest logs.
    pub fn take_logs(&mut self) -> Vec<LogEntry> {
        std::mem::take(&mut self.logs)
    }

    pub(crate) fn cached_instance(&self, content_hash: &str) -> Option<Instance> {
        self.instances.get(content_hash).copied()
    }

    pub(crate) fn cache_instance(&mut self, content_hash: &str, instance: Instance) {
        self.instances.insert(content_hash.to_owned(), instance);
    }

    /// Add a log entry.
    pub fn log(&mut self, level: LogLevel, message: String) {
        self.logs.push(LogEntry {
            level,
            message,
            timestamp: Instant::now(),
        });
    }
}

/// Create a new store bound to `engine` with a zero fuel balance.
pub fn create_store(engine: &WasmEngine, host: &HostConfig) -> Store<StoreContext> {
    let context = StoreContext::new(*host);
    debug!(
        store_id = %context.store_id,
        consume_fuel = engine.consume_fuel(),
        "Store created"
    );
    Store::new(engine.inner(), context)
}

/// Current fuel balance. Always zero when the engine does not meter fuel.
pub fn fuel_balance(store: &Store<StoreContext>) -> u64 {
    store.get_fuel().unwrap_or(0)
}

/// Add `amount` units of fuel and return the new balance.
///
/// # Errors
///
/// - [`RuntimeError::InvalidArgument`] if `amount` is negative
/// - [`RuntimeError::FuelDisabled`] if the engine does not meter fuel
/// - [`RuntimeError::FuelOverflow`] if the balance would exceed `u64::MAX`
pub fn add_fuel(store: &mut Store<StoreContext>, amount: i64) -> Result<u64, RuntimeError> {
    let amount = u64::try_from(amount).map_err(|_| {
        RuntimeError::invalid_argument(format!("fuel amount must be non-negative, got {amount}"))
    })?;

    let balance = store.get_fuel().map_err(|_| RuntimeError::FuelDisabled)?;
    let updated = balance
        .checked_add(amount)
        .ok_or(RuntimeError::FuelOverflow { balance, amount })?;

    store
        .set_fuel(updated)
        .map_err(|e| RuntimeError::invalid_config(format!("Failed to set fuel: {e}")))?;

    debug!(
        store_id = %store.data().store_id,
        added = amount,
        balance = updated,
        "Fuel added"
    );

    Ok(updated)
}

/// A store shared between concurrent executions.
///
/// Executions hold the lock for their whole duration, so the fuel
/// decrement-and-check of one execution can never interleave with another's.
/// Two executions racing for fuel that covers only one of them will see
/// exactly one succeed.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<Store<StoreContext>>>,
}

impl SharedStore {
    pub fn new(store: Store<StoreContext>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Acquire exclusive access to the store.
    pub async fn lock(&self) -> MutexGuard<'_, Store<StoreContext>> {
        self.inner.lock().await
    }

    /// See [`add_fuel`].
    pub async fn add_fuel(&self, amount: i64) -> Result<u64, RuntimeError> {
        add_fuel(&mut *self.lock().await, amount)
    }

    /// See [`fuel_balance`].
    pub async fn fuel_balance(&self) -> u64 {
        fuel_balance(&*self.lock().await)
    }
}

impl std::fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStore").finish_non_exhaustive()
    }
}

//! Fuel-metered execution of WebAssembly instances.
//!
//! [`InstanceRunner`] handles the lifecycle of one execution:
//!
//! 1. Instantiate the module against the store on first use (start functions
//!    are metered); later executions reuse that instance
//! 2. Look up and call the entry point
//! 3. Classify any trap and capture its backtrace
//! 4. Record fuel and timing metrics on the store
//!
//! Traps are results, not errors: fuel exhaustion in particular is an
//! expected outcome the caller recovers from by funding the store and
//! trying again.

use std::time::Instant;

use tracing::{debug, error, info, instrument, warn};
use wasmtime::{Linker, Store, WasmParams, WasmResults};

use crate::backtrace::trap_report;
use crate::store::{SharedStore, StoreContext, fuel_balance};
use crate::{CompiledModule, WasmEngine};
use fuelbox_common::{RuntimeError, TrapCause, TrapReport};

/// Result of executing a WebAssembly export.
#[derive(Debug)]
pub enum ExecutionResult<R = ()> {
    /// Execution completed and returned `R`.
    Success(R),

    /// Execution aborted with a trap.
    Trap(TrapReport),
}

impl<R> ExecutionResult<R> {
    /// Returns `true` if execution was successful.
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success(_))
    }

    /// Returns `true` if execution trapped.
    pub fn is_trap(&self) -> bool {
        matches!(self, ExecutionResult::Trap(_))
    }

    /// Returns `true` if execution ran out of fuel.
    pub fn is_fuel_exhausted(&self) -> bool {
        self.trap().is_some_and(TrapReport::is_fuel_exhausted)
    }

    /// The trap report, if execution trapped.
    pub fn trap(&self) -> Option<&TrapReport> {
        match self {
            ExecutionResult::Trap(report) => Some(report),
            ExecutionResult::Success(_) => None,
        }
    }

    /// Convert into a `Result`, turning a trap into [`RuntimeError::Trap`].
    pub fn into_result(self) -> Result<R, RuntimeError> {
        match self {
            ExecutionResult::Success(value) => Ok(value),
            ExecutionResult::Trap(report) => Err(report.into()),
        }
    }
}

/// Instance lifecycle manager.
///
/// Each execution uses the caller's [`Store`], so fuel accumulates per
/// store and a store can be funded and retried any number of times.
/// Register host functions through [`InstanceRunner::linker_mut`] before the
/// first execution.
pub struct InstanceRunner {
    engine: WasmEngine,
    linker: Linker<StoreContext>,
}

impl InstanceRunner {
    pub fn new(engine: &WasmEngine) -> Self {
        Self {
            linker: Linker::new(engine.inner()),
            engine: engine.clone(),
        }
    }

    /// Get a mutable reference to the linker.
    ///
    /// Use this to register host functions.
    pub fn linker_mut(&mut self) -> &mut Linker<StoreContext> {
        &mut self.linker
    }

    /// Get the engine reference.
    pub fn engine(&self) -> &WasmEngine {
        &self.engine
    }

    /// Execute a `() -> ()` export.
    pub async fn execute_core(
        &self,
        module: &CompiledModule,
        store: &mut Store<StoreContext>,
        entry_point: &str,
    ) -> Result<ExecutionResult, RuntimeError> {
        self.invoke::<(), ()>(module, store, entry_point, ()).await
    }

    /// Execute a `() -> ()` export against a store shared with other tasks.
    ///
    /// The store stays locked for the whole execution.
    pub async fn execute_shared(
        &self,
        module: &CompiledModule,
        store: &SharedStore,
        entry_point: &str,
    ) -> Result<ExecutionResult, RuntimeError> {
        let mut guard = store.lock().await;
        self.execute_core(module, &mut guard, entry_point).await
    }

    /// Call the typed export `entry_point`, instantiating `module` in this
    /// store on first use.
    ///
    /// Guest logs on the store are reset at the start of every call.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Instantiation fails for a reason other than a trap
    /// - The entry point is missing or has a different signature
    ///
    /// Traps, including fuel exhaustion, are returned as
    /// [`ExecutionResult::Trap`].
    #[instrument(skip(self, module, store, params), fields(entry_point = %entry_point))]
    pub async fn invoke<P, R>(
        &self,
        module: &CompiledModule,
        store: &mut Store<StoreContext>,
        entry_point: &str,
        params: P,
    ) -> Result<ExecutionResult<R>, RuntimeError>
    where
        P: WasmParams + Send + Sync,
        R: WasmResults + Send + Sync,
    {
        let start = Instant::now();
        let initial_fuel = fuel_balance(store);
        let details = self.engine.backtrace_details();
        store.data_mut().logs.clear();

        let instance = match store.data().cached_instance(module.content_hash()) {
            Some(instance) => instance,
            None => {
                debug!(
                    store_id = %store.data().store_id,
                    initial_fuel,
                    "Instantiating core module"
                );

                match self
                    .linker
                    .instantiate_async(&mut *store, module.inner())
                    .await
                {
                    Ok(instance) => {
                        store
                            .data_mut()
                            .cache_instance(module.content_hash(), instance);
                        instance
                    }
                    Err(e) => {
                        let Some(report) = trap_report(&e, details) else {
                            return Err(RuntimeError::instantiation_failed(e.to_string()));
                        };
                        Self::record_metrics(store, initial_fuel, start);
                        return Ok(Self::trapped(store, report));
                    }
                }
            }
        };

        let func = instance.get_typed_func::<P, R>(&mut *store, entry_point);
        let func = match func {
            Ok(func) => func,
            Err(e) => {
                // A start function may already have spent fuel
                Self::record_metrics(store, initial_fuel, start);
                debug!(error = %e, "Entry point lookup failed");
                return Err(RuntimeError::entry_point_not_found(entry_point));
            }
        };

        debug!("Executing entry point");

        let result = func.call_async(&mut *store, params).await;
        Self::record_metrics(store, initial_fuel, start);

        match result {
            Ok(value) => {
                let metrics = &store.data().metrics;
                info!(
                    duration_ms = metrics.duration.unwrap_or_default().as_millis(),
                    fuel_consumed = metrics.fuel_consumed,
                    "Execution completed successfully"
                );
                Ok(ExecutionResult::Success(value))
            }
            Err(e) => {
                let report = trap_report(&e, details).unwrap_or_else(|| TrapReport {
                    cause: TrapCause::Host(e.root_cause().to_string()),
                    message: e.to_string(),
                    frames: Vec::new(),
                });
                Ok(Self::trapped(store, report))
            }
        }
    }

    fn record_metrics(store: &mut Store<StoreContext>, initial_fuel: u64, start: Instant) {
        let fuel_consumed = initial_fuel.saturating_sub(fuel_balance(store));
        let metrics = &mut store.data_mut().metrics;
        metrics.fuel_consumed = fuel_consumed;
        metrics.duration = Some(start.elapsed());
    }

    fn trapped<R>(store: &Store<StoreContext>, report: TrapReport) -> ExecutionResult<R> {
        let metrics = &store.data().metrics;
        let duration_ms = metrics.duration.unwrap_or_default().as_millis();

        if report.is_fuel_exhausted() {
            warn!(
                duration_ms,
                fuel_consumed = metrics.fuel_consumed,
                frames = report.frames.len(),
                "Execution terminated: fuel exhausted"
            );
        } else {
            error!(
                duration_ms,
                fuel_consumed = metrics.fuel_consumed,
                trap = %report,
                "Execution trapped"
            );
        }

        ExecutionResult::Trap(report)
    }
}

impl std::fmt::Debug for InstanceRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceRunner")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

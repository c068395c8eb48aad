//! Host function registration for Wasmtime linkers.

use fuelbox_common::RuntimeError;
use fuelbox_core::StoreContext;
use tracing::warn;
use wasmtime::{Caller, Linker};

use crate::logging::{LoggingHost, level_from_i32};
use crate::metering::{charge_fuel, fuel_remaining};

/// Register all standard host functions:
/// - `env::log`
/// - `env::fuel_remaining`
pub fn register_all(linker: &mut Linker<StoreContext>) -> Result<(), RuntimeError> {
    register_logging(linker)?;
    register_fuel_remaining(linker)?;
    Ok(())
}

/// Register `env::log(level: i32, ptr: i32, len: i32)`.
///
/// The call is charged [`HostConfig::log_cost`](fuelbox_common::HostConfig::log_cost)
/// before the message is read, so a store that cannot pay traps with
/// out-of-fuel and records nothing. A call with a negative pointer or length
/// is charged the flat `log_base_fuel` and then ignored.
///
/// # Memory Protocol
///
/// - `level`: Log level (0=debug, 1=info, 2=warn, 3=error)
/// - `ptr`: Pointer to the message string in the exported `memory`
/// - `len`: Length of the message in bytes (UTF-8)
pub fn register_logging(linker: &mut Linker<StoreContext>) -> Result<(), RuntimeError> {
    linker
        .func_wrap(
            "env",
            "log",
            |mut caller: Caller<'_, StoreContext>,
             level: i32,
             ptr: i32,
             len: i32|
             -> anyhow::Result<()> {
                let (Ok(start), Ok(len)) = (usize::try_from(ptr), usize::try_from(len)) else {
                    // Rejected calls still pay the flat cost
                    let base = caller.data().host.log_base_fuel;
                    charge_fuel(&mut caller, base)?;
                    warn!(ptr, len, "Invalid pointer or length (negative value)");
                    return Ok(());
                };

                let cost = caller.data().host.log_cost(len as u64);
                charge_fuel(&mut caller, cost)?;

                let Some(memory) = caller
                    .get_export("memory")
                    .and_then(wasmtime::Extern::into_memory)
                else {
                    warn!("Memory export not found in guest module");
                    return Ok(());
                };

                // Copy out before borrowing the context mutably
                let message = {
                    let data = memory.data(&caller);
                    let Some(bytes) = start
                        .checked_add(len)
                        .and_then(|end| data.get(start..end))
                    else {
                        warn!(
                            start,
                            len,
                            memory_size = data.len(),
                            "Memory access out of bounds"
                        );
                        return Ok(());
                    };
                    String::from_utf8_lossy(bytes).into_owned()
                };

                LoggingHost::log(caller.data_mut(), level_from_i32(level), &message);
                Ok(())
            },
        )
        .map_err(|e| {
            RuntimeError::invalid_config(format!("Failed to register log function: {e}"))
        })?;

    Ok(())
}

/// Register `env::fuel_remaining() -> i64`, returning -1 when fuel is not
/// metered.
pub fn register_fuel_remaining(linker: &mut Linker<StoreContext>) -> Result<(), RuntimeError> {
    linker
        .func_wrap("env", "fuel_remaining", |caller: Caller<'_, StoreContext>| {
            fuel_remaining(&caller)
        })
        .map_err(|e| {
            RuntimeError::invalid_config(format!("Failed to register fuel_remaining: {e}"))
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuelbox_common::{EngineConfig, HostConfig};
    use fuelbox_core::{
        CompiledModule, InstanceRunner, LogLevel, WasmEngine, add_fuel, create_store,
    };
    use tokio_test::block_on;

    const LOG_WAT: &str = r#"
        (module
            (import "env" "log" (func $log (param i32 i32 i32)))
            (memory (export "memory") 1)
            (data (i32.const 0) "metered")
            (func (export "_start")
                (call $log (i32.const 2) (i32.const 0) (i32.const 7))
            )
        )
    "#;

    const FUEL_WAT: &str = r#"
        (module
            (import "env" "fuel_remaining" (func $fuel (result i64)))
            (func (export "fuel") (result i64)
                (call $fuel)
            )
        )
    "#;

    fn runner(engine: &WasmEngine) -> InstanceRunner {
        let mut runner = InstanceRunner::new(engine);
        register_all(runner.linker_mut()).unwrap();
        runner
    }

    #[test]
    fn test_register_all() {
        let engine = WasmEngine::new(&EngineConfig::default()).unwrap();
        let mut linker = Linker::new(engine.inner());

        assert!(register_all(&mut linker).is_ok());
    }

    #[test]
    fn test_log_charges_fuel() {
        let engine = WasmEngine::new(&EngineConfig::default().with_consume_fuel(true)).unwrap();
        let runner = runner(&engine);
        let module = CompiledModule::from_wat(&engine, LOG_WAT).unwrap();
        let host = HostConfig {
            log_base_fuel: 100,
            log_fuel_per_byte: 10,
        };
        let mut store = create_store(&engine, &host);
        add_fuel(&mut store, 1_000).unwrap();

        let result = block_on(runner.execute_core(&module, &mut store, "_start")).unwrap();

        assert!(result.is_success());
        assert_eq!(store.data().logs.len(), 1);
        assert_eq!(store.data().logs[0].message, "metered");
        assert_eq!(store.data().logs[0].level, LogLevel::Warn);
        // 100 + 7 * 10 for the call, plus the guest's own instructions
        assert!(store.data().metrics.fuel_consumed >= 170);
    }

    #[test]
    fn test_log_without_enough_fuel_records_nothing() {
        let engine = WasmEngine::new(&EngineConfig::default().with_consume_fuel(true)).unwrap();
        let runner = runner(&engine);
        let module = CompiledModule::from_wat(&engine, LOG_WAT).unwrap();
        let host = HostConfig {
            log_base_fuel: 10_000,
            log_fuel_per_byte: 0,
        };
        let mut store = create_store(&engine, &host);
        add_fuel(&mut store, 1_000).unwrap();

        let result = block_on(runner.execute_core(&module, &mut store, "_start")).unwrap();

        assert!(result.is_fuel_exhausted());
        assert!(store.data().logs.is_empty());
    }

    const BAD_LOG_WAT: &str = r#"
        (module
            (import "env" "log" (func $log (param i32 i32 i32)))
            (memory (export "memory") 1)
            (func (export "_start")
                (call $log (i32.const 1) (i32.const -1) (i32.const 4))
            )
        )
    "#;

    #[test]
    fn test_rejected_log_is_still_charged() {
        let engine = WasmEngine::new(&EngineConfig::default().with_consume_fuel(true)).unwrap();
        let runner = runner(&engine);
        let module = CompiledModule::from_wat(&engine, BAD_LOG_WAT).unwrap();
        let host = HostConfig {
            log_base_fuel: 100,
            log_fuel_per_byte: 0,
        };
        let mut store = create_store(&engine, &host);
        add_fuel(&mut store, 1_000).unwrap();

        let result = block_on(runner.execute_core(&module, &mut store, "_start")).unwrap();

        assert!(result.is_success());
        assert!(store.data().logs.is_empty());
        assert!(store.data().metrics.fuel_consumed >= 100);
    }

    #[test]
    fn test_rejected_log_traps_when_unaffordable() {
        let engine = WasmEngine::new(&EngineConfig::default().with_consume_fuel(true)).unwrap();
        let runner = runner(&engine);
        let module = CompiledModule::from_wat(&engine, BAD_LOG_WAT).unwrap();
        let host = HostConfig {
            log_base_fuel: 10_000,
            log_fuel_per_byte: 0,
        };
        let mut store = create_store(&engine, &host);
        add_fuel(&mut store, 1_000).unwrap();

        let result = block_on(runner.execute_core(&module, &mut store, "_start")).unwrap();

        assert!(result.is_fuel_exhausted());
    }

    #[test]
    fn test_fuel_remaining_visible_to_guest() {
        let engine = WasmEngine::new(&EngineConfig::default().with_consume_fuel(true)).unwrap();
        let runner = runner(&engine);
        let module = CompiledModule::from_wat(&engine, FUEL_WAT).unwrap();
        let mut store = create_store(&engine, &HostConfig::default());
        add_fuel(&mut store, 500).unwrap();

        let remaining = block_on(runner.invoke::<(), i64>(&module, &mut store, "fuel", ()))
            .unwrap()
            .into_result()
            .unwrap();

        assert!(remaining > 0 && remaining < 500, "remaining = {remaining}");
    }

    #[test]
    fn test_fuel_remaining_unmetered() {
        let engine = WasmEngine::new(&EngineConfig::default()).unwrap();
        let runner = runner(&engine);
        let module = CompiledModule::from_wat(&engine, FUEL_WAT).unwrap();
        let mut store = create_store(&engine, &HostConfig::default());

        let remaining = block_on(runner.invoke::<(), i64>(&module, &mut store, "fuel", ()))
            .unwrap()
            .into_result()
            .unwrap();

        assert_eq!(remaining, -1);
    }
}

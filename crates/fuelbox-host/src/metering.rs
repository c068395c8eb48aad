//! Fuel accounting at the host-call boundary.

use fuelbox_core::StoreContext;
use tracing::{debug, warn};
use wasmtime::{Caller, Trap};

/// Charge `amount` fuel against the calling store.
///
/// Does nothing on an engine without fuel consumption. If the balance cannot
/// cover `amount`, it is drained to zero and the call fails with
/// [`Trap::OutOfFuel`], which unwinds the guest exactly like running out of
/// fuel on a wasm instruction.
pub fn charge_fuel(caller: &mut Caller<'_, StoreContext>, amount: u64) -> anyhow::Result<()> {
    let Ok(balance) = caller.get_fuel() else {
        return Ok(());
    };

    if balance < amount {
        warn!(
            store_id = %caller.data().store_id,
            balance,
            requested = amount,
            "Host call exhausted fuel"
        );
        caller.set_fuel(0)?;
        return Err(Trap::OutOfFuel.into());
    }

    caller.set_fuel(balance - amount)?;
    debug!(charged = amount, remaining = balance - amount, "Host call charged");
    Ok(())
}

/// Fuel left in the calling store, or -1 if fuel is not metered.
pub fn fuel_remaining(caller: &Caller<'_, StoreContext>) -> i64 {
    caller
        .get_fuel()
        .map_or(-1, |fuel| i64::try_from(fuel).unwrap_or(i64::MAX))
}

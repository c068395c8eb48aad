//! Host functions for fuelbox.
//!
//! Host calls run native code outside the metered guest instructions. Each
//! host function here charges fuel before doing its work, so a guest cannot
//! escape its budget by looping over host calls, and running out of fuel
//! inside a host call raises the same trap as running out in guest code.
//!
//! # Interfaces
//!
//! - [`logging`]: `env.log`, guest logs captured on the store
//! - [`metering`]: `env.fuel_remaining` and the [`charge_fuel`] primitive
//! - [`linker`]: registration on a Wasmtime linker

pub mod linker;
pub mod logging;
pub mod metering;

pub use linker::register_all;
pub use logging::LoggingHost;
pub use metering::charge_fuel;

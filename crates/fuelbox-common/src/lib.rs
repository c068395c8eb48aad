//! Common types, errors, and configuration for fuelbox.
//!
//! This crate provides shared functionality used across the fuelbox workspace:
//! - [`EngineConfig`]: the immutable engine-wide switches (fuel, backtraces)
//! - [`RuntimeConfig`]: TOML-loadable configuration for engine and host calls
//! - Error types using `thiserror` for type-safe error handling
//! - The trap and backtrace data model reported to callers

pub mod config;
pub mod config_file;
pub mod error;
pub mod trap;

pub use config::EngineConfig;
pub use config_file::{ConfigFileError, HostConfig, RuntimeConfig};
pub use error::RuntimeError;
pub use trap::{FrameSymbol, TrapCause, TrapFrame, TrapReport};

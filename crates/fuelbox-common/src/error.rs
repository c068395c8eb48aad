//! Error types for fuelbox.
//!
//! [`RuntimeError`] covers every failure a caller can observe, from
//! compilation to execution. Configuration values themselves cannot be
//! invalid, so there is no configuration error kind for them.

use std::io;

use thiserror::Error;

use crate::trap::TrapReport;

/// Top-level runtime errors.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// WebAssembly compilation failed.
    #[error("Compilation failed: {reason}")]
    CompilationFailed {
        /// Description of the compilation failure.
        reason: String,
    },

    /// Instantiation failed for a reason other than a trap (e.g. unresolved
    /// imports).
    #[error("Instantiation failed: {reason}")]
    InstantiationFailed { reason: String },

    /// The requested export does not exist or has a different signature.
    #[error("Entry point not found: {name}")]
    EntryPointNotFound { name: String },

    /// A fuel operation was attempted on an engine built without fuel
    /// consumption.
    #[error("Fuel consumption is not enabled for this engine")]
    FuelDisabled,

    /// An argument failed validation.
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Adding fuel would overflow the balance.
    #[error("Fuel overflow: balance {balance} + {amount} exceeds u64::MAX")]
    FuelOverflow { balance: u64, amount: u64 },

    /// Execution trapped.
    ///
    /// The report keeps the trap cause and, when enabled, the symbolicated
    /// frames.
    #[error("Wasm trap: {0}")]
    Trap(Box<TrapReport>),

    /// The engine rejected its configuration.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl RuntimeError {
    /// Create a new `CompilationFailed` error.
    pub fn compilation_failed(reason: impl Into<String>) -> Self {
        Self::CompilationFailed {
            reason: reason.into(),
        }
    }

    /// Create a new `InstantiationFailed` error.
    pub fn instantiation_failed(reason: impl Into<String>) -> Self {
        Self::InstantiationFailed {
            reason: reason.into(),
        }
    }

    /// Create a new `EntryPointNotFound` error.
    pub fn entry_point_not_found(name: impl Into<String>) -> Self {
        Self::EntryPointNotFound { name: name.into() }
    }

    /// Create a new `InvalidArgument` error.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create a new `InvalidConfig` error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Returns the trap report if this error is a trap.
    pub fn trap_report(&self) -> Option<&TrapReport> {
        match self {
            Self::Trap(report) => Some(report.as_ref()),
            _ => None,
        }
    }

    /// Returns `true` if this error is a fuel-exhaustion trap.
    pub fn is_fuel_exhausted(&self) -> bool {
        self.trap_report()
            .is_some_and(TrapReport::is_fuel_exhausted)
    }
}

impl From<TrapReport> for RuntimeError {
    fn from(report: TrapReport) -> Self {
        Self::Trap(Box::new(report))
    }
}

//! Trap and backtrace data reported to callers.
//!
//! A [`TrapReport`] is produced whenever execution aborts with a trap. The
//! [`TrapCause`] discriminant always survives, so fuel exhaustion can be told
//! apart from every other fault. Frames are ordered innermost first; whether
//! they carry names and source locations depends on the engine's
//! `backtrace_details` switch.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why execution trapped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum TrapCause {
    /// The store ran out of fuel.
    OutOfFuel,
    /// An `unreachable` instruction was executed.
    Unreachable,
    /// Out-of-bounds linear memory access.
    MemoryOutOfBounds,
    /// Call stack exhausted.
    StackOverflow,
    /// Integer division or remainder by zero.
    IntegerDivisionByZero,
    /// Integer overflow in division or conversion.
    IntegerOverflow,
    /// `call_indirect` through a null table entry.
    IndirectCallToNull,
    /// `call_indirect` signature mismatch.
    BadSignature,
    /// Any other engine trap code, by name.
    Other(String),
    /// A host function failed with an error that is not a trap code.
    Host(String),
}

impl fmt::Display for TrapCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrapCause::OutOfFuel => write!(f, "all fuel consumed"),
            TrapCause::Unreachable => write!(f, "unreachable instruction executed"),
            TrapCause::MemoryOutOfBounds => write!(f, "out of bounds memory access"),
            TrapCause::StackOverflow => write!(f, "call stack exhausted"),
            TrapCause::IntegerDivisionByZero => write!(f, "integer divide by zero"),
            TrapCause::IntegerOverflow => write!(f, "integer overflow"),
            TrapCause::IndirectCallToNull => write!(f, "indirect call to null"),
            TrapCause::BadSignature => write!(f, "indirect call type mismatch"),
            TrapCause::Other(code) => write!(f, "trap: {code}"),
            TrapCause::Host(message) => write!(f, "host error: {message}"),
        }
    }
}

/// Source-level information attached to a frame from debug info.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FrameSymbol {
    pub name: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

impl FrameSymbol {
    /// Returns `true` if this symbol has a file and line.
    pub fn has_location(&self) -> bool {
        self.file.is_some() && self.line.is_some()
    }
}

/// One WebAssembly stack frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TrapFrame {
    /// Index of the function in its module.
    pub func_index: u32,

    /// Byte offset of the faulting instruction within the module.
    pub module_offset: Option<usize>,

    /// Byte offset of the faulting instruction within the function body.
    pub func_offset: Option<usize>,

    /// Function name, only when backtrace details are enabled.
    pub func_name: Option<String>,

    /// Debug-info symbols, only when backtrace details are enabled.
    pub symbols: Vec<FrameSymbol>,
}

impl TrapFrame {
    /// Best available human-readable name for this frame.
    pub fn symbol_name(&self) -> Option<&str> {
        self.symbols
            .iter()
            .find_map(|s| s.name.as_deref())
            .or(self.func_name.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// Returns `true` if any name or source location is attached.
    pub fn is_symbolicated(&self) -> bool {
        self.func_name.is_some() || !self.symbols.is_empty()
    }
}

impl fmt::Display for TrapFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "func[{}]", self.func_index)?;
        if let Some(offset) = self.module_offset {
            write!(f, " @ {offset:#x}")?;
        }
        if let Some(name) = self.symbol_name() {
            write!(f, " {name}")?;
        }
        if let Some(symbol) = self.symbols.iter().find(|s| s.has_location()) {
            if let (Some(file), Some(line)) = (&symbol.file, symbol.line) {
                write!(f, " at {file}:{line}")?;
                if let Some(column) = symbol.column {
                    write!(f, ":{column}")?;
                }
            }
        }
        Ok(())
    }
}

/// A trap raised during instantiation or execution.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TrapReport {
    pub cause: TrapCause,

    /// Full message from the engine.
    pub message: String,

    /// Stack frames, innermost first. Empty when no wasm frames were live.
    pub frames: Vec<TrapFrame>,
}

impl TrapReport {
    /// Returns `true` if the trap was caused by fuel exhaustion.
    pub fn is_fuel_exhausted(&self) -> bool {
        self.cause == TrapCause::OutOfFuel
    }

    /// Returns `true` if at least one frame carries symbol information.
    pub fn is_symbolicated(&self) -> bool {
        self.frames.iter().any(TrapFrame::is_symbolicated)
    }
}

impl fmt::Display for TrapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cause)?;
        for (i, frame) in self.frames.iter().enumerate() {
            write!(f, "\n  {i}: {frame}")?;
        }
        Ok(())
    }
}

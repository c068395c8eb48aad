//! Conversion of Wasmtime errors into [`TrapReport`]s.

use wasmtime::{FrameInfo, Trap, WasmBacktrace};

use fuelbox_common::{FrameSymbol, TrapCause, TrapFrame, TrapReport};

/// Build a report for `error` if it aborted wasm execution.
///
/// Returns `None` for errors that are not traps and carry no wasm frames,
/// such as unresolved imports at instantiation. With `details` off, frames
/// keep only indices and offsets even if the module has a name section.
pub fn trap_report(error: &wasmtime::Error, details: bool) -> Option<TrapReport> {
    let backtrace = error.downcast_ref::<WasmBacktrace>();

    let cause = match error.downcast_ref::<Trap>() {
        Some(trap) => classify(*trap),
        None if backtrace.is_some() => TrapCause::Host(error.root_cause().to_string()),
        None => return None,
    };

    let frames = backtrace
        .map(|bt| bt.frames().iter().map(|f| frame(f, details)).collect())
        .unwrap_or_default();

    Some(TrapReport {
        cause,
        message: error.root_cause().to_string(),
        frames,
    })
}

/// Returns `true` if `error` is a fuel-exhaustion trap.
pub fn is_out_of_fuel(error: &wasmtime::Error) -> bool {
    error
        .downcast_ref::<Trap>()
        .is_some_and(|trap| *trap == Trap::OutOfFuel)
}

fn classify(trap: Trap) -> TrapCause {
    match trap {
        Trap::OutOfFuel => TrapCause::OutOfFuel,
        Trap::UnreachableCodeReached => TrapCause::Unreachable,
        Trap::MemoryOutOfBounds => TrapCause::MemoryOutOfBounds,
        Trap::StackOverflow => TrapCause::StackOverflow,
        Trap::IntegerDivisionByZero => TrapCause::IntegerDivisionByZero,
        Trap::IntegerOverflow => TrapCause::IntegerOverflow,
        Trap::IndirectCallToNull => TrapCause::IndirectCallToNull,
        Trap::BadSignature => TrapCause::BadSignature,
        other => TrapCause::Other(format!("{other:?}")),
    }
}

fn frame(info: &FrameInfo, details: bool) -> TrapFrame {
    let mut frame = TrapFrame {
        func_index: info.func_index(),
        module_offset: info.module_offset(),
        func_offset: info.func_offset(),
        ..TrapFrame::default()
    };

    if details {
        frame.func_name = info.func_name().map(str::to_owned);
        frame.symbols = info
            .symbols()
            .iter()
            .map(|s| FrameSymbol {
                name: s.name().map(str::to_owned),
                file: s.file().map(str::to_owned),
                line: s.line(),
                column: s.column(),
            })
            .collect();
    }

    frame
}

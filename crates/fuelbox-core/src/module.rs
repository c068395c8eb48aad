//! WebAssembly module compilation.
//!
//! [`CompiledModule`] wraps a Wasmtime [`Module`]. Compilation happens under
//! the engine's frozen configuration: fuel checks are woven into the
//! generated code, and debug info is parsed only when backtrace details are
//! enabled.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::Path;
use std::time::Instant;

use tracing::{info, instrument};
use wasmtime::Module;

use crate::WasmEngine;
use fuelbox_common::RuntimeError;

/// A compiled WebAssembly module.
///
/// Cheap to clone and shareable across stores of the same engine.
#[derive(Clone)]
pub struct CompiledModule {
    module: Module,

    /// Hash of the original Wasm bytes or WAT source.
    content_hash: String,
}

impl CompiledModule {
    /// Compile a core module from WebAssembly bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if compilation fails (e.g., invalid Wasm).
    #[instrument(skip(engine, bytes), fields(bytes_len = bytes.len()))]
    pub fn from_bytes(engine: &WasmEngine, bytes: &[u8]) -> Result<Self, RuntimeError> {
        Self::validate_wasm_header(bytes)?;
        Self::compile(engine, bytes, "Core module")
    }

    /// Compile a core module from WAT (WebAssembly Text Format).
    #[instrument(skip(engine, wat))]
    pub fn from_wat(engine: &WasmEngine, wat: &str) -> Result<Self, RuntimeError> {
        Self::compile(engine, wat.as_bytes(), "WAT module")
    }

    /// Read and compile a `.wasm` or `.wat` file.
    #[instrument(skip(engine, path))]
    pub fn from_file(engine: &WasmEngine, path: impl AsRef<Path>) -> Result<Self, RuntimeError> {
        let bytes = std::fs::read(path.as_ref())?;
        if bytes.starts_with(b"\0asm") {
            Self::from_bytes(engine, &bytes)
        } else {
            Self::compile(engine, &bytes, "WAT file")
        }
    }

    fn compile(engine: &WasmEngine, bytes: &[u8], kind: &str) -> Result<Self, RuntimeError> {
        let start = Instant::now();

        let module = Module::new(engine.inner(), bytes)
            .map_err(|e| RuntimeError::compilation_failed(format!("{kind} compilation failed: {e}")))?;

        let content_hash = compute_hash(bytes);

        info!(
            content_hash = %content_hash,
            debug_info = engine.backtrace_details(),
            duration_ms = start.elapsed().as_millis(),
            "{kind} compiled"
        );

        Ok(Self {
            module,
            content_hash,
        })
    }

    /// Get the content hash of the original source.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Get the inner Wasmtime module.
    pub fn inner(&self) -> &Module {
        &self.module
    }

    /// Validate WebAssembly header (magic number).
    fn validate_wasm_header(bytes: &[u8]) -> Result<(), RuntimeError> {
        if bytes.len() < 8 {
            return Err(RuntimeError::compilation_failed(
                "Invalid Wasm: file too small",
            ));
        }

        if &bytes[0..4] != b"\0asm" {
            return Err(RuntimeError::compilation_failed(
                "Invalid Wasm: bad magic number",
            ));
        }

        Ok(())
    }
}

impl std::fmt::Debug for CompiledModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledModule")
            .field("content_hash", &self.content_hash)
            .finish_non_exhaustive()
    }
}

fn compute_hash(bytes: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

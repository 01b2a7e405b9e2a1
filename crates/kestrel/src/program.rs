//! Host-side program state.
//!
//! A [`Program`] owns everything a kernel launch needs: field storage, the
//! host values kernels may capture, the host functions they may call, and a
//! cache of compiled kernels. Changing any host fact invalidates the cache,
//! since compiled kernels fold those facts in.

use indexmap::map::Entry;
use indexmap::IndexMap;
use kestrel_ast::ast::Kernel;
use kestrel_ast::error::CompileError;
use kestrel_ast::foundation::{FieldDecl, FunctionSig, HostValue};
use kestrel_ir::interpret::Interpreter;
use kestrel_ir::{FieldStorage, HostFunctions, InterpretError, KernelIr, Value};
use kestrel_resolve::{HostFacts, ResolveOptions};
use thiserror::Error;
use tracing::debug;

use crate::compile::compile_kernel;

/// Errors from compiling or launching kernels through a [`Program`].
#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("kernel '{kernel}' failed to compile with {} error(s)", .errors.len())]
    Compile {
        kernel: String,
        errors: Vec<CompileError>,
    },

    #[error(transparent)]
    Interpret(#[from] InterpretError),
}

impl ProgramError {
    /// Compile diagnostics, if this is a compile failure.
    pub fn compile_errors(&self) -> Option<&[CompileError]> {
        match self {
            ProgramError::Compile { errors, .. } => Some(errors),
            ProgramError::Interpret(_) => None,
        }
    }
}

pub type ProgramResult<T> = Result<T, ProgramError>;

struct CompiledKernel {
    source: Kernel,
    ir: KernelIr,
}

pub struct Program {
    host: HostFacts,
    options: ResolveOptions,
    storage: FieldStorage,
    functions: HostFunctions,
    kernels: IndexMap<String, CompiledKernel>,
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl Program {
    pub fn new() -> Self {
        Self::with_options(ResolveOptions::default())
    }

    pub fn with_options(options: ResolveOptions) -> Self {
        Self {
            host: HostFacts::new(),
            options,
            storage: FieldStorage::new(),
            functions: HostFunctions::new(),
            kernels: IndexMap::new(),
        }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn host(&self) -> &HostFacts {
        &self.host
    }

    /// Allocate a zero-initialized field.
    pub fn add_field(&mut self, name: impl Into<String>, decl: FieldDecl) -> ProgramResult<()> {
        let name = name.into();
        self.storage.declare(name.clone(), decl.clone())?;
        self.host.fields.insert(name, decl);
        self.invalidate();
        Ok(())
    }

    /// Make a host value capturable by kernels under `name`.
    pub fn set_global(&mut self, name: impl Into<String>, value: HostValue) {
        self.host.globals.insert(name.into(), value);
        self.invalidate();
    }

    pub fn register_function<F>(&mut self, name: impl Into<String>, sig: FunctionSig, f: F)
    where
        F: FnMut(&[Value]) -> Result<Value, String> + 'static,
    {
        let name = name.into();
        self.functions.register(name.clone(), f);
        self.host.functions.insert(name, sig);
        self.invalidate();
    }

    fn invalidate(&mut self) {
        if !self.kernels.is_empty() {
            debug!(kernels = self.kernels.len(), "host facts changed, dropping compiled kernels");
            self.kernels.clear();
        }
    }

    /// Compile `kernel`, reusing the cached IR when the same kernel was
    /// compiled before.
    pub fn compile(&mut self, kernel: &Kernel) -> ProgramResult<&KernelIr> {
        compile_cached(&mut self.kernels, &self.host, &self.options, kernel)
    }

    /// Compile (if needed) and run `kernel` with positional arguments.
    pub fn launch(&mut self, kernel: &Kernel, args: &[Value]) -> ProgramResult<Option<Value>> {
        let ir = compile_cached(&mut self.kernels, &self.host, &self.options, kernel)?;
        let result = Interpreter::new(&mut self.storage, &mut self.functions).run(ir, args)?;
        Ok(result)
    }

    pub fn compiled(&self, name: &str) -> Option<&KernelIr> {
        self.kernels.get(name).map(|c| &c.ir)
    }

    /// Read a field slot; `index` is empty for rank-0 fields.
    pub fn get(&self, field: &str, index: &[i64]) -> ProgramResult<Value> {
        Ok(self.storage.get(field, index)?)
    }

    /// Write a field slot, converting to the field's element type.
    pub fn set(&mut self, field: &str, index: &[i64], value: impl Into<Value>) -> ProgramResult<()> {
        Ok(self.storage.set(field, index, value.into())?)
    }
}

fn compile_cached<'a>(
    kernels: &'a mut IndexMap<String, CompiledKernel>,
    host: &HostFacts,
    options: &ResolveOptions,
    kernel: &Kernel,
) -> ProgramResult<&'a KernelIr> {
    match kernels.entry(kernel.name.clone()) {
        Entry::Occupied(entry) if entry.get().source == *kernel => {
            debug!(kernel = %kernel.name, "using cached kernel");
            Ok(&entry.into_mut().ir)
        }
        entry => {
            let ir = compile_kernel(kernel, host, options).map_err(|errors| ProgramError::Compile {
                kernel: kernel.name.clone(),
                errors,
            })?;
            let compiled = CompiledKernel {
                source: kernel.clone(),
                ir,
            };
            let slot = match entry {
                Entry::Occupied(mut entry) => {
                    entry.insert(compiled);
                    entry.into_mut()
                }
                Entry::Vacant(entry) => entry.insert(compiled),
            };
            Ok(&slot.ir)
        }
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("fields", &self.host.fields.keys().collect::<Vec<_>>())
            .field("globals", &self.host.globals.keys().collect::<Vec<_>>())
            .field("functions", &self.functions)
            .field("kernels", &self.kernels.keys().collect::<Vec<_>>())
            .finish()
    }
}

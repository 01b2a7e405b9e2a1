//! Compile API.

use kestrel_ast::ast::Kernel;
use kestrel_ast::error::{CompileError, DiagnosticFormatter};
use kestrel_ast::foundation::SourceMap;
use kestrel_ir::KernelIr;
use kestrel_resolve::{resolve_kernel, HostFacts, ResolveOptions};

/// Compiles one kernel against the host's fields, globals and functions.
///
/// Alias resolution, typing, destructuring and lowering all run here. A
/// kernel with any diagnostic produces no IR.
///
/// # Errors
/// Returns every [`CompileError`] found, subject to `options.policy` and
/// `options.max_errors`.
pub fn compile_kernel(
    kernel: &Kernel,
    host: &HostFacts,
    options: &ResolveOptions,
) -> Result<KernelIr, Vec<CompileError>> {
    resolve_kernel(kernel, host, options)
}

/// Serializes a [`KernelIr`] to a MessagePack byte vector.
pub fn serialize_kernel(kernel: &KernelIr) -> Result<Vec<u8>, rmp_serde::encode::Error> {
    rmp_serde::to_vec_named(kernel)
}

/// Deserializes a [`KernelIr`] from a MessagePack byte slice.
pub fn deserialize_kernel(data: &[u8]) -> Result<KernelIr, rmp_serde::decode::Error> {
    rmp_serde::from_slice(data)
}

/// Formats compilation errors with source context.
pub fn format_errors(errors: &[CompileError], source_map: &SourceMap) -> String {
    let formatter = DiagnosticFormatter::new(source_map);
    formatter.format_all(errors)
}

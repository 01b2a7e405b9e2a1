//! Destructuring assignment.
//!
//! `t0, t1, ... = source` resolves in four steps:
//!
//! 1. [`collect_targets`] - the ordered targets and the types they require
//! 2. [`classify`] - how the source decomposes ([`SourceDescriptor`])
//! 3. [`validate`] - arity, then element-wise assignability
//! 4. [`sequence`] - evaluate every element, then store every target
//!
//! A statement that fails any step produces diagnostics and no instructions.
//! Plain `x = e` goes through the same validation and sequencing as a
//! one-target destructure of a singular source.

pub mod classify;
pub mod collect;
pub mod sequence;
pub mod validate;


use kestrel_ast::ast::{Expr, Target};
use kestrel_ast::error::CompileError;
use kestrel_ast::foundation::{DataType, Span};
use kestrel_ir::{Instr, Place};
use tracing::trace;

use super::context::ResolveContext;
use super::typing::type_of;

pub use classify::{classify, SourceDescriptor, SourceElement, Unpacked};
pub use collect::{collect_targets, ResolvedTarget};
pub use sequence::{sequence, TempAllocator};
pub use validate::{validate, Assignment};

/// Output of resolving one assignment statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub instrs: Vec<Instr>,
    /// Locals declared by this statement's stores, in target order
    pub declared: Vec<(String, DataType)>,
}

/// Resolve `targets = source`.
pub fn resolve_unpack(
    targets: &[Target],
    source: &Expr,
    span: Span,
    ctx: &ResolveContext,
    temps: &mut TempAllocator,
) -> Result<Resolution, Vec<CompileError>> {
    let resolved = collect_targets(targets, span, ctx)?;
    let descriptor = classify(source, ctx).map_err(|e| vec![e])?;
    trace!(
        targets = resolved.len(),
        source = %descriptor.kind_name(),
        arity = descriptor.arity(),
        "classified unpack source"
    );

    let assignments = validate(&resolved, &descriptor, span)?;
    let base = descriptor.unpacked().and_then(|u| u.base.as_ref());
    finish(&assignments, base, ctx, temps)
}

/// Resolve plain `target = value`.
pub fn resolve_assign(
    target: &Target,
    value: &Expr,
    span: Span,
    ctx: &ResolveContext,
    temps: &mut TempAllocator,
) -> Result<Resolution, Vec<CompileError>> {
    let resolved = collect_targets(std::slice::from_ref(target), span, ctx)?;
    let ty = type_of(value, ctx).map_err(|e| vec![e])?;
    let descriptor = SourceDescriptor::Singular(SourceElement {
        expr: value.clone(),
        ty,
    });
    let assignments = validate(&resolved, &descriptor, span)?;
    finish(&assignments, None, ctx, temps)
}

fn finish(
    assignments: &[Assignment],
    base: Option<&Expr>,
    ctx: &ResolveContext,
    temps: &mut TempAllocator,
) -> Result<Resolution, Vec<CompileError>> {
    let instrs = sequence(assignments, base, ctx, temps).map_err(|e| vec![e])?;
    trace!(instrs = instrs.len(), "sequenced assignment");

    let declared = assignments
        .iter()
        .filter_map(|a| match (&a.place, &a.declares) {
            (Place::Local(name), Some(ty)) => Some((name.clone(), ty.clone())),
            _ => None,
        })
        .collect();
    Ok(Resolution { instrs, declared })
}

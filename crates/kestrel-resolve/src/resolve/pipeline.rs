//! Kernel resolution pipeline.
//!
//! Orchestrates alias resolution, statement resolution and lowering to turn
//! a [`Kernel`] into a [`KernelIr`]. Statements are visited in source order;
//! each one either contributes its instructions or its diagnostics, and a
//! kernel with any error produces no IR at all.

use kestrel_ast::ast::{Kernel, Stmt, StmtKind};
use kestrel_ast::error::{CompileError, ErrorKind};
use kestrel_ast::foundation::{DataType, PrimitiveType};
use kestrel_ir::{Instr, KernelIr};
use tracing::debug;

use super::alias::resolve_aliases;
use super::context::{HostFacts, ResolveContext};
use super::diagnostics::{type_mismatch, Diagnostics};
use super::lower::{convert, lower_as, lower_expr};
use super::typing::type_of;
use super::unpack::{resolve_assign, resolve_unpack, Resolution, TempAllocator};
use crate::config::ResolveOptions;

/// Resolves a kernel against the host's facts.
///
/// Returns every diagnostic found (subject to the policy and cap in
/// `options`) if any statement fails.
pub fn resolve_kernel(
    kernel: &Kernel,
    host: &HostFacts,
    options: &ResolveOptions,
) -> Result<KernelIr, Vec<CompileError>> {
    debug!(kernel = %kernel.name, statements = kernel.body.len(), "resolving kernel");

    let mut resolver = KernelResolver {
        ctx: ResolveContext::new(host, options),
        temps: TempAllocator::new(),
        diags: Diagnostics::new(options),
        ret: kernel.ret.clone(),
    };

    let kernel = match resolve_aliases(kernel, host) {
        Ok(kernel) => kernel,
        Err(errors) => {
            resolver.diags.extend(errors);
            return Err(resolver.reject(&kernel.name));
        }
    };

    resolver.declare_params(&kernel);
    let body = if resolver.diags.has_errors() {
        Vec::new()
    } else {
        resolver.block(&kernel.body)
    };

    if resolver.diags.has_errors() {
        return Err(resolver.reject(&kernel.name));
    }

    let ir = KernelIr {
        name: kernel.name.clone(),
        params: kernel
            .params
            .iter()
            .map(|p| (p.name.clone(), p.ty.clone()))
            .collect(),
        ret: kernel.ret.clone(),
        body,
        temp_count: resolver.temps.count(),
    };
    debug!(
        kernel = %ir.name,
        instrs = ir.instr_count(),
        temps = ir.temp_count,
        "kernel resolved"
    );
    Ok(ir)
}

struct KernelResolver<'a> {
    ctx: ResolveContext<'a>,
    temps: TempAllocator,
    diags: Diagnostics,
    ret: Option<DataType>,
}

impl KernelResolver<'_> {
    fn reject(self, name: &str) -> Vec<CompileError> {
        let errors = self.diags.into_errors();
        debug!(kernel = %name, errors = errors.len(), "kernel rejected");
        errors
    }

    fn declare_params(&mut self, kernel: &Kernel) {
        for param in &kernel.params {
            if self.ctx.local(&param.name).is_some() {
                self.diags.report(CompileError::new(
                    ErrorKind::InvalidExpression,
                    kernel.span,
                    format!("duplicate parameter '{}'", param.name),
                ));
                continue;
            }
            if param.ty.element_type().is_none() {
                self.diags.report(CompileError::new(
                    ErrorKind::TypeMismatch,
                    kernel.span,
                    format!("parameter '{}' cannot have type {}", param.name, param.ty),
                ));
                continue;
            }
            self.ctx.declare_local(param.name.clone(), param.ty.clone());
        }
    }

    fn block(&mut self, body: &[Stmt]) -> Vec<Instr> {
        let mut instrs = Vec::new();
        for stmt in body {
            if self.diags.should_stop() {
                break;
            }
            match self.stmt(stmt) {
                Ok(mut out) => instrs.append(&mut out),
                Err(errors) => self.diags.extend(errors),
            }
        }
        instrs
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<Vec<Instr>, Vec<CompileError>> {
        match &stmt.kind {
            StmtKind::Assign { target, value } => {
                let resolution = resolve_assign(target, value, stmt.span, &self.ctx, &mut self.temps)?;
                Ok(self.commit(resolution))
            }
            StmtKind::Unpack { targets, source } => {
                let resolution =
                    resolve_unpack(targets, source, stmt.span, &self.ctx, &mut self.temps)?;
                Ok(self.commit(resolution))
            }
            StmtKind::StaticBind { .. } => Err(vec![CompileError::internal(
                stmt.span,
                "static binding reached statement resolution",
            )]),
            StmtKind::For {
                var,
                start,
                end,
                body,
            } => {
                let index: DataType = PrimitiveType::I32.into();
                let mut errors = Vec::new();
                for bound in [start, end] {
                    match type_of(bound, &self.ctx) {
                        Ok(DataType::Primitive(p)) if p.is_integral() => {}
                        Ok(other) => errors.push(CompileError::new(
                            ErrorKind::TypeMismatch,
                            bound.span,
                            format!("loop bound must be an integer, found {other}"),
                        )),
                        Err(e) => errors.push(e),
                    }
                }
                match self.ctx.local(var) {
                    Some(ty) if *ty != index => errors.push(CompileError::new(
                        ErrorKind::TypeMismatch,
                        stmt.span,
                        format!("loop variable '{var}' is already a {ty}"),
                    )),
                    _ => {}
                }
                if !errors.is_empty() {
                    return Err(errors);
                }

                let start = lower_as(start, &index, &self.ctx).map_err(|e| vec![e])?;
                let end = lower_as(end, &index, &self.ctx).map_err(|e| vec![e])?;
                let scope = self.ctx.enter_scope();
                self.ctx.declare_local(var.clone(), index);
                let body = self.block(body);
                self.ctx.exit_scope(scope);
                Ok(vec![Instr::Loop {
                    var: var.clone(),
                    start,
                    end,
                    body,
                }])
            }
            StmtKind::Return(value) => {
                let Some(ret) = self.ret.clone() else {
                    return Err(vec![CompileError::new(
                        ErrorKind::InvalidExpression,
                        stmt.span,
                        "return with a value in a kernel without a return type".to_string(),
                    )]);
                };
                let found = type_of(value, &self.ctx).map_err(|e| vec![e])?;
                if !found.assignable_to(&ret) {
                    return Err(vec![type_mismatch(value.span, 0, &ret, &found)
                        .with_note("the kernel's declared return type".to_string())]);
                }
                let lowered = lower_expr(value, &self.ctx).map_err(|e| vec![e])?;
                Ok(vec![Instr::Return(convert(lowered, &found, &ret))])
            }
        }
    }

    fn commit(&mut self, resolution: Resolution) -> Vec<Instr> {
        for (name, ty) in resolution.declared {
            self.ctx.declare_local(name, ty);
        }
        resolution.instrs
    }
}

//! Left-hand-side collection.

use kestrel_ast::ast::{Target, TargetKind};
use kestrel_ast::error::{CompileError, ErrorKind};
use kestrel_ast::foundation::{DataType, Span};
use kestrel_ir::Place;

use crate::resolve::context::ResolveContext;
use crate::resolve::diagnostics::empty_target_list;
use crate::resolve::lower::lower_target;

/// A target with the storage it names and the type it requires.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTarget {
    pub target: Target,
    pub place: Place,
    /// `None` for a local that is not declared yet; it takes the type of
    /// the value first stored into it.
    pub ty: Option<DataType>,
}

/// Resolve `targets` in source order.
pub fn collect_targets(
    targets: &[Target],
    span: Span,
    ctx: &ResolveContext,
) -> Result<Vec<ResolvedTarget>, Vec<CompileError>> {
    if targets.is_empty() {
        return Err(vec![empty_target_list(span)]);
    }

    let mut resolved = Vec::with_capacity(targets.len());
    let mut errors = Vec::new();
    for target in targets {
        let ty = match &target.kind {
            TargetKind::Local(name) => ctx.local(name).cloned(),
            TargetKind::FieldElement { field, index } => match ctx.field(field) {
                None => {
                    errors.push(CompileError::new(
                        ErrorKind::UndefinedName,
                        target.span,
                        format!("undefined field '{field}'"),
                    ));
                    continue;
                }
                Some(decl) if !decl.shape.contains(index) => {
                    errors.push(CompileError::new(
                        ErrorKind::IndexOutOfBounds,
                        target.span,
                        format!(
                            "index {index:?} is out of bounds for field '{field}' of shape {}",
                            decl.shape
                        ),
                    ));
                    continue;
                }
                Some(decl) => Some(decl.element.clone()),
            },
        };
        resolved.push(ResolvedTarget {
            target: target.clone(),
            place: lower_target(target),
            ty,
        });
    }

    if errors.is_empty() {
        Ok(resolved)
    } else {
        Err(errors)
    }
}

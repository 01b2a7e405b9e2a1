//! Evaluate-then-assign sequencing.
//!
//! ```text
//! a[None], b[None], c[None] = b[None], c[None], a[None]
//!
//!   %0 = load b[None]      ; every element evaluated, left to right
//!   %1 = load c[None]
//!   %2 = load a[None]
//!   store %0 -> a[None]    ; then every store, left to right
//!   store %1 -> b[None]
//!   store %2 -> c[None]
//! ```
//!
//! No store is emitted before the last element is evaluated, so targets that
//! also appear in the source read their old values.

use kestrel_ast::ast::Expr;
use kestrel_ast::error::CompileResult;
use kestrel_ir::{Instr, LoweredExpr, TempId};

use super::validate::Assignment;
use crate::resolve::context::ResolveContext;
use crate::resolve::lower::{lower_as, lower_expr};
use crate::resolve::typing::type_of;

/// Hands out kernel-unique temporaries.
#[derive(Debug, Default)]
pub struct TempAllocator {
    next: u32,
}

impl TempAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> TempId {
        let id = TempId(self.next);
        self.next += 1;
        id
    }

    /// Number of temporaries allocated so far.
    pub fn count(&self) -> u32 {
        self.next
    }
}

/// Emit the two-phase block for validated `assignments`.
///
/// `base` is the value the elements are components of, if any. When it has
/// effects it is evaluated once into a staging temporary and the elements
/// read from that.
pub fn sequence(
    assignments: &[Assignment],
    base: Option<&Expr>,
    ctx: &ResolveContext,
    temps: &mut TempAllocator,
) -> CompileResult<Vec<Instr>> {
    let mut instrs = Vec::with_capacity(assignments.len() * 2 + 1);

    let staged = match base {
        Some(base) if base.has_effects() => {
            let dest = temps.fresh();
            instrs.push(Instr::Eval {
                dest,
                value: lower_expr(base, ctx)?,
                ty: type_of(base, ctx)?,
            });
            Some(dest)
        }
        _ => None,
    };

    let mut evaluated = Vec::with_capacity(assignments.len());
    for (index, assignment) in assignments.iter().enumerate() {
        let element = &assignment.element;
        let value = match staged {
            Some(stage) => LoweredExpr::Component {
                base: Box::new(LoweredExpr::Temp(stage)),
                index,
            },
            None => lower_as(&element.expr, &element.ty, ctx)?,
        };
        let dest = temps.fresh();
        instrs.push(Instr::Eval {
            dest,
            value,
            ty: element.ty.clone(),
        });
        evaluated.push(dest);
    }

    for (src, assignment) in evaluated.into_iter().zip(assignments) {
        instrs.push(Instr::Store {
            src,
            place: assignment.place.clone(),
            cast: assignment.cast,
        });
    }

    Ok(instrs)
}

//! Expression lowering.
//!
//! Turns typed AST expressions into IR operands. Captured host values are
//! folded into constants, vector and matrix components are converted to the
//! promoted element type, and call arguments to their parameter types.

use kestrel_ast::ast::{Expr, ExprKind, Target, TargetKind};
use kestrel_ast::error::{CompileError, CompileResult, ErrorKind};
use kestrel_ast::foundation::{DataType, HostValue, Span, TypedConstant};
use kestrel_ir::{LoweredExpr, Place};

use super::context::ResolveContext;
use super::typing::{binary_element, shape_extents, type_of};

pub fn lower_expr(expr: &Expr, ctx: &ResolveContext) -> CompileResult<LoweredExpr> {
    let span = expr.span;
    Ok(match &expr.kind {
        ExprKind::Literal(c) => LoweredExpr::Const(*c),
        ExprKind::Local(name) => {
            type_of(expr, ctx)?;
            LoweredExpr::Load(Place::Local(name.clone()))
        }
        ExprKind::Global(name) => {
            let value = ctx.global(name).ok_or_else(|| {
                CompileError::new(
                    ErrorKind::UndefinedName,
                    span,
                    format!("undefined name '{name}'"),
                )
            })?;
            lower_host_value(value, span, ctx)?
        }
        ExprKind::FieldHandle(name) => {
            return Err(CompileError::new(
                ErrorKind::InvalidExpression,
                span,
                format!("field handle '{name}' cannot be used as a value"),
            )
            .with_note(format!("index the field to read it, e.g. {name}[None]")))
        }
        ExprKind::FieldElement { field, index } => {
            type_of(expr, ctx)?;
            LoweredExpr::Load(Place::FieldElement {
                field: field.clone(),
                index: index.clone(),
            })
        }
        ExprKind::ShapeOf(field) => {
            let decl = ctx.field(field).ok_or_else(|| {
                CompileError::new(
                    ErrorKind::UndefinedName,
                    span,
                    format!("undefined field '{field}'"),
                )
            })?;
            LoweredExpr::Tuple(
                shape_extents(field, decl, span)?
                    .into_iter()
                    .map(|d| LoweredExpr::Const(TypedConstant::i32(d)))
                    .collect(),
            )
        }
        ExprKind::Tuple(items) => LoweredExpr::Tuple(
            items
                .iter()
                .map(|item| lower_expr(item, ctx))
                .collect::<CompileResult<_>>()?,
        ),
        ExprKind::Vector(items) => {
            let ty = type_of(expr, ctx)?;
            LoweredExpr::Vector(lower_components(items.iter(), &ty, ctx)?)
        }
        ExprKind::Matrix(rows) => {
            let ty = type_of(expr, ctx)?;
            let &DataType::Matrix { rows: r, cols: c, .. } = &ty else {
                return Err(CompileError::internal(span, format!("matrix typed as {ty}")));
            };
            LoweredExpr::Matrix {
                rows: r,
                cols: c,
                elements: lower_components(rows.iter().flatten(), &ty, ctx)?,
            }
        }
        ExprKind::Component { base, index } => {
            type_of(expr, ctx)?;
            LoweredExpr::Component {
                base: Box::new(lower_expr(base, ctx)?),
                index: *index,
            }
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let result = type_of(expr, ctx)?;
            let (Some(a), Some(b)) = (
                type_of(lhs, ctx)?.element_type(),
                type_of(rhs, ctx)?.element_type(),
            ) else {
                return Err(CompileError::internal(span, format!("binary typed as {result}")));
            };
            LoweredExpr::Binary {
                op: *op,
                ty: binary_element(*op, a, b, ctx),
                lhs: Box::new(lower_expr(lhs, ctx)?),
                rhs: Box::new(lower_expr(rhs, ctx)?),
            }
        }
        ExprKind::Call { func, args } => {
            type_of(expr, ctx)?;
            let params = ctx
                .function(func)
                .map(|sig| sig.params.clone())
                .unwrap_or_default();
            LoweredExpr::Call {
                func: func.clone(),
                args: args
                    .iter()
                    .zip(&params)
                    .map(|(arg, param)| lower_as(arg, param, ctx))
                    .collect::<CompileResult<_>>()?,
            }
        }
    })
}

/// Lower `expr` and convert it element-wise to the element type of `ty`.
pub fn lower_as(expr: &Expr, ty: &DataType, ctx: &ResolveContext) -> CompileResult<LoweredExpr> {
    let found = type_of(expr, ctx)?;
    Ok(convert(lower_expr(expr, ctx)?, &found, ty))
}

/// Wrap `value` in a cast when its element type differs from `to`'s.
pub fn convert(value: LoweredExpr, from: &DataType, to: &DataType) -> LoweredExpr {
    match (from.element_type(), to.element_type()) {
        (Some(f), Some(t)) if f != t => LoweredExpr::Cast {
            ty: t,
            value: Box::new(value),
        },
        _ => value,
    }
}

pub fn lower_target(target: &Target) -> Place {
    match &target.kind {
        TargetKind::FieldElement { field, index } => Place::FieldElement {
            field: field.clone(),
            index: index.clone(),
        },
        TargetKind::Local(name) => Place::Local(name.clone()),
    }
}

fn lower_components<'e>(
    items: impl Iterator<Item = &'e Expr>,
    ty: &DataType,
    ctx: &ResolveContext,
) -> CompileResult<Vec<LoweredExpr>> {
    let Some(elem) = ty.element_type() else {
        return Ok(Vec::new());
    };
    items.map(|item| lower_as(item, &elem.into(), ctx)).collect()
}

fn lower_host_value(value: &HostValue, span: Span, ctx: &ResolveContext) -> CompileResult<LoweredExpr> {
    Ok(match value {
        HostValue::Int(v) => LoweredExpr::Const(TypedConstant::int(ctx.options.default_int, *v)),
        HostValue::Float(v) => {
            LoweredExpr::Const(TypedConstant::float(ctx.options.default_float, *v))
        }
        HostValue::Sequence(items) => LoweredExpr::Tuple(
            items
                .iter()
                .map(|item| lower_host_value(item, span, ctx))
                .collect::<CompileResult<_>>()?,
        ),
        HostValue::Opaque(what) => {
            return Err(CompileError::new(
                ErrorKind::InvalidExpression,
                span,
                format!("{what} cannot be used inside a kernel"),
            ))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolveOptions;
    use crate::resolve::context::HostFacts;
    use kestrel_ast::ast::build::*;
    use kestrel_ast::foundation::{FieldDecl, PrimitiveType};

    fn lower(expr: &Expr) -> CompileResult<LoweredExpr> {
        let host = HostFacts::new()
            .with_field("d", FieldDecl::new(PrimitiveType::I32, vec![2, 3, 4]))
            .with_global("g", HostValue::Sequence(vec![HostValue::Int(7), HostValue::Float(1.5)]))
            .with_global("obj", HostValue::Opaque("host dict".to_string()));
        let options = ResolveOptions::default();
        let ctx = ResolveContext::new(&host, &options);
        lower_expr(expr, &ctx)
    }

    #[test]
    fn test_shape_becomes_constants() {
        assert_eq!(
            lower(&shape_of("d")).unwrap(),
            LoweredExpr::Tuple(vec![
                LoweredExpr::Const(TypedConstant::i32(2)),
                LoweredExpr::Const(TypedConstant::i32(3)),
                LoweredExpr::Const(TypedConstant::i32(4)),
            ])
        );
    }

    #[test]
    fn test_globals_fold_to_defaults() {
        assert_eq!(
            lower(&global("g")).unwrap(),
            LoweredExpr::Tuple(vec![
                LoweredExpr::Const(TypedConstant::i32(7)),
                LoweredExpr::Const(TypedConstant::f32(1.5)),
            ])
        );
        assert_eq!(
            lower(&global("obj")).unwrap_err().kind,
            ErrorKind::InvalidExpression
        );
    }

    #[test]
    fn test_vector_components_are_converted() {
        let lowered = lower(&vector(vec![lit_i32(2), lit_f32(0.5)])).unwrap();
        assert_eq!(
            lowered,
            LoweredExpr::Vector(vec![
                LoweredExpr::Cast {
                    ty: PrimitiveType::F32,
                    value: Box::new(LoweredExpr::Const(TypedConstant::i32(2))),
                },
                LoweredExpr::Const(TypedConstant::f32(0.5)),
            ])
        );
    }

    #[test]
    fn test_field_handle_is_not_a_value() {
        let host = HostFacts::new().with_field("a", FieldDecl::scalar(PrimitiveType::F32));
        let options = ResolveOptions::default();
        let ctx = ResolveContext::new(&host, &options);
        let err = lower_expr(&handle("a"), &ctx).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidExpression);
    }
}

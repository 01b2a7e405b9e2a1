//! Static expression typing.
//!
//! Computes the [`DataType`] of a kernel expression from the host facts and
//! the locals declared so far. Nothing here inspects runtime values: a field
//! element's type is its container's element type, a shape query is a tuple
//! of `i32` whatever the extents are.
//!
//! # Rules
//!
//! | expression | type |
//! |------------|------|
//! | literal | its primitive |
//! | local / parameter | declared type |
//! | global | see [`ResolveContext::host_value_type`] |
//! | `f[i, j]` | element type of `f`, index bounds-checked |
//! | `f.shape` | `(i32, ...)`, one entry per axis |
//! | `(a, b)` | tuple of element types |
//! | `[a, b]` | vector of the promoted element type |
//! | `[[a, b], [c, d]]` | matrix of the promoted element type, rows must agree |
//! | `a op b` | promoted; `/` on integers gives the default float |
//! | `f(args)` | the host function's return type |

use kestrel_ast::ast::{BinaryOp, Expr, ExprKind};
use kestrel_ast::error::{CompileError, CompileResult, ErrorKind};
use kestrel_ast::foundation::{DataType, FieldDecl, PrimitiveType, Span};

use super::context::ResolveContext;
use super::diagnostics::type_mismatch;

/// Static type of `expr`.
pub fn type_of(expr: &Expr, ctx: &ResolveContext) -> CompileResult<DataType> {
    let span = expr.span;
    match &expr.kind {
        ExprKind::Literal(c) => Ok(c.ty.into()),

        ExprKind::Local(name) => ctx
            .local(name)
            .cloned()
            .ok_or_else(|| undefined(span, "local", name)),

        ExprKind::Global(name) => ctx
            .global(name)
            .map(|value| ctx.host_value_type(value))
            .ok_or_else(|| undefined(span, "name", name)),

        ExprKind::FieldHandle(name) => {
            if ctx.field(name).is_none() {
                return Err(undefined(span, "field", name));
            }
            Ok(DataType::opaque(format!("field handle '{name}'")))
        }

        ExprKind::FieldElement { field, index } => {
            let decl = ctx
                .field(field)
                .ok_or_else(|| undefined(span, "field", field))?;
            if !decl.shape.contains(index) {
                return Err(CompileError::new(
                    ErrorKind::IndexOutOfBounds,
                    span,
                    format!(
                        "index {index:?} is out of bounds for field '{field}' of shape {}",
                        decl.shape
                    ),
                ));
            }
            Ok(decl.element.clone())
        }

        ExprKind::ShapeOf(field) => {
            let decl = ctx
                .field(field)
                .ok_or_else(|| undefined(span, "field", field))?;
            let extents = shape_extents(field, decl, span)?;
            Ok(DataType::Tuple(vec![PrimitiveType::I32.into(); extents.len()]))
        }

        ExprKind::Tuple(items) => Ok(DataType::Tuple(
            items
                .iter()
                .map(|item| type_of(item, ctx))
                .collect::<CompileResult<_>>()?,
        )),

        ExprKind::Vector(items) => {
            let elem = promoted_elements(items, span, ctx, "vector")?;
            let n = u8::try_from(items.len()).map_err(|_| {
                shape_error(span, format!("vector of {} components is too long", items.len()))
            })?;
            Ok(DataType::vector(elem, n))
        }

        ExprKind::Matrix(rows) => {
            let cols = rows.first().map_or(0, Vec::len);
            if cols == 0 {
                return Err(shape_error(span, "matrix must have at least one component".to_string()));
            }
            if let Some(bad) = rows.iter().position(|row| row.len() != cols) {
                return Err(shape_error(
                    span,
                    format!(
                        "matrix row {bad} has {} components, expected {cols}",
                        rows[bad].len()
                    ),
                ));
            }
            let items: Vec<Expr> = rows.iter().flatten().cloned().collect();
            let elem = promoted_elements(&items, span, ctx, "matrix")?;
            let (rows, cols) = match (u8::try_from(rows.len()), u8::try_from(cols)) {
                (Ok(r), Ok(c)) => (r, c),
                _ => return Err(shape_error(span, "matrix is too large".to_string())),
            };
            Ok(DataType::matrix(elem, rows, cols))
        }

        ExprKind::Component { base, index } => {
            let base_ty = type_of(base, ctx)?;
            component_type(&base_ty, *index, span)
        }

        ExprKind::Binary { op, lhs, rhs } => {
            let lt = type_of(lhs, ctx)?;
            let rt = type_of(rhs, ctx)?;
            binary_type(*op, &lt, &rt, span, ctx)
        }

        ExprKind::Call { func, args } => {
            let sig = ctx
                .function(func)
                .ok_or_else(|| undefined(span, "function", func))?;
            if sig.params.len() != args.len() {
                return Err(CompileError::new(
                    ErrorKind::WrongArgCount,
                    span,
                    format!(
                        "function '{func}' takes {} arguments but {} were given",
                        sig.params.len(),
                        args.len()
                    ),
                ));
            }
            for (i, (arg, param)) in args.iter().zip(&sig.params).enumerate() {
                let found = type_of(arg, ctx)?;
                if !found.assignable_to(param) {
                    return Err(type_mismatch(arg.span, i, param, &found)
                        .with_note(format!("argument {i} of '{func}'")));
                }
            }
            Ok(sig.ret.clone())
        }
    }
}

/// Type of component `index` of a vector or tuple.
pub fn component_type(base: &DataType, index: usize, span: Span) -> CompileResult<DataType> {
    let len = match base {
        DataType::Vector { elem, n } if index < *n as usize => return Ok((*elem).into()),
        DataType::Tuple(items) if index < items.len() => return Ok(items[index].clone()),
        DataType::Vector { n, .. } => *n as usize,
        DataType::Tuple(items) => items.len(),
        other => {
            return Err(CompileError::new(
                ErrorKind::InvalidExpression,
                span,
                format!("cannot take a component of {other}"),
            ))
        }
    };
    Err(CompileError::new(
        ErrorKind::IndexOutOfBounds,
        span,
        format!("component {index} is out of range for {base} of length {len}"),
    ))
}

/// Element type produced by `op` on two primitive element types.
pub fn binary_element(op: BinaryOp, lhs: PrimitiveType, rhs: PrimitiveType, ctx: &ResolveContext) -> PrimitiveType {
    let ty = lhs.promote(rhs);
    if op == BinaryOp::Div && ty.is_integral() {
        ctx.options.default_float
    } else {
        ty
    }
}

fn binary_type(
    op: BinaryOp,
    lhs: &DataType,
    rhs: &DataType,
    span: Span,
    ctx: &ResolveContext,
) -> CompileResult<DataType> {
    match (lhs, rhs) {
        (DataType::Primitive(a), DataType::Primitive(b)) => {
            Ok(binary_element(op, *a, *b, ctx).into())
        }
        (DataType::Vector { elem: a, n }, DataType::Vector { elem: b, n: m }) if n == m => {
            Ok(DataType::vector(binary_element(op, *a, *b, ctx), *n))
        }
        _ => Err(CompileError::new(
            ErrorKind::TypeMismatch,
            span,
            format!(
                "unsupported operand types for '{}': {lhs} and {rhs}",
                op.symbol()
            ),
        )),
    }
}

fn promoted_elements(
    items: &[Expr],
    span: Span,
    ctx: &ResolveContext,
    what: &str,
) -> CompileResult<PrimitiveType> {
    let mut elem: Option<PrimitiveType> = None;
    for item in items {
        let ty = type_of(item, ctx)?;
        let p = ty.as_primitive().ok_or_else(|| {
            CompileError::new(
                ErrorKind::TypeMismatch,
                item.span,
                format!("{what} components must be scalars, found {ty}"),
            )
        })?;
        elem = Some(elem.map_or(p, |e| e.promote(p)));
    }
    elem.ok_or_else(|| shape_error(span, format!("{what} must have at least one component")))
}

fn undefined(span: Span, what: &str, name: &str) -> CompileError {
    CompileError::new(
        ErrorKind::UndefinedName,
        span,
        format!("undefined {what} '{name}'"),
    )
}

/// Extents of `field` as the `i32` values a shape query produces.
pub fn shape_extents(field: &str, decl: &FieldDecl, span: Span) -> CompileResult<Vec<i32>> {
    decl.shape
        .dims()
        .iter()
        .enumerate()
        .map(|(axis, &d)| {
            i32::try_from(d).map_err(|_| {
                shape_error(
                    span,
                    format!("extent {d} of '{field}' axis {axis} does not fit in i32"),
                )
            })
        })
        .collect()
}

fn shape_error(span: Span, message: String) -> CompileError {
    CompileError::new(ErrorKind::ShapeMismatch, span, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolveOptions;
    use crate::resolve::context::HostFacts;
    use kestrel_ast::ast::build::*;
    use kestrel_ast::foundation::{FieldDecl, FunctionSig, HostValue};

    fn host() -> HostFacts {
        HostFacts::new()
            .with_field("a", FieldDecl::scalar(PrimitiveType::F32))
            .with_field("d", FieldDecl::new(PrimitiveType::I32, vec![2, 3, 4]))
            .with_field("huge", FieldDecl::new(PrimitiveType::U1, vec![u32::MAX]))
            .with_global("k", HostValue::Sequence(vec![HostValue::Int(1), HostValue::Float(0.5)]))
            .with_function(
                "scale",
                FunctionSig::new(vec![PrimitiveType::F32.into()], PrimitiveType::F32),
            )
    }

    fn ty(expr: &Expr) -> CompileResult<DataType> {
        let host = host();
        let options = ResolveOptions::default();
        let mut ctx = ResolveContext::new(&host, &options);
        ctx.declare_local("v", DataType::vector(PrimitiveType::I32, 3));
        type_of(expr, &ctx)
    }

    #[test]
    fn test_field_element_and_shape() {
        assert_eq!(ty(&elem("a", &[])).unwrap(), PrimitiveType::F32.into());
        assert_eq!(
            ty(&shape_of("d")).unwrap(),
            DataType::Tuple(vec![PrimitiveType::I32.into(); 3])
        );
        let err = ty(&elem("d", &[2, 0, 0])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IndexOutOfBounds);
    }

    #[test]
    fn test_vector_promotes_components() {
        let v = vector(vec![lit_i32(2), lit_f32(3.5)]);
        assert_eq!(ty(&v).unwrap(), DataType::vector(PrimitiveType::F32, 2));
    }

    #[test]
    fn test_ragged_matrix() {
        let m = matrix(vec![vec![lit_i32(1), lit_i32(2)], vec![lit_i32(3)]]);
        assert_eq!(ty(&m).unwrap_err().kind, ErrorKind::ShapeMismatch);
        let m = matrix(vec![vec![lit_i32(1), lit_i32(2)], vec![lit_i32(3), lit_i32(4)]]);
        assert_eq!(ty(&m).unwrap(), DataType::matrix(PrimitiveType::I32, 2, 2));
    }

    #[test]
    fn test_integer_true_division() {
        let e = binary(BinaryOp::Div, lit_i32(1), lit_i32(2));
        assert_eq!(ty(&e).unwrap(), PrimitiveType::F32.into());
        let e = add(lit_i32(1), lit_typed(PrimitiveType::I64, 2));
        assert_eq!(ty(&e).unwrap(), PrimitiveType::I64.into());
    }

    #[test]
    fn test_globals_and_components() {
        assert_eq!(
            ty(&component(global("k"), 1)).unwrap(),
            PrimitiveType::F32.into()
        );
        assert_eq!(
            ty(&component(local("v"), 2)).unwrap(),
            PrimitiveType::I32.into()
        );
        assert_eq!(
            ty(&component(local("v"), 3)).unwrap_err().kind,
            ErrorKind::IndexOutOfBounds
        );
    }

    #[test]
    fn test_calls_checked_against_signature() {
        assert_eq!(
            ty(&call("scale", vec![lit_i32(1)])).unwrap(),
            PrimitiveType::F32.into()
        );
        assert_eq!(
            ty(&call("scale", vec![])).unwrap_err().kind,
            ErrorKind::WrongArgCount
        );
        assert_eq!(
            ty(&call("scale", vec![local("v")])).unwrap_err().kind,
            ErrorKind::TypeMismatch
        );
        assert_eq!(
            ty(&call("missing", vec![])).unwrap_err().kind,
            ErrorKind::UndefinedName
        );
    }

    #[test]
    fn test_shape_extent_must_fit_i32() {
        let err = ty(&shape_of("huge")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ShapeMismatch);
    }

    #[test]
    fn test_undefined_names() {
        assert_eq!(ty(&local("nope")).unwrap_err().message, "undefined local 'nope'");
        assert_eq!(ty(&handle("nope")).unwrap_err().kind, ErrorKind::UndefinedName);
    }
}

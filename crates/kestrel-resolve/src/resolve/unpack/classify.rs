//! Right-hand-side classification.
//!
//! Decides, from static facts only, whether a source decomposes into a fixed
//! number of elements and what those elements are. Classification never
//! evaluates anything: a shape query yields constants read from the field
//! declaration, a vector-typed value yields component reads of that value.

use kestrel_ast::ast::{Expr, ExprKind};
use kestrel_ast::error::{CompileError, CompileResult, ErrorKind};
use kestrel_ast::foundation::{DataType, HostValue, PrimitiveType, TypedConstant};

use crate::resolve::context::ResolveContext;
use crate::resolve::typing::{shape_extents, type_of};

/// One element a source decomposes into, with its static type.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceElement {
    pub expr: Expr,
    pub ty: DataType,
}

/// Elements of a decomposable source.
///
/// `base` is set when the elements are component reads of one value (a
/// vector-typed local, a call returning a tuple, ...). The sequencer stages a
/// base that has effects so it is evaluated exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct Unpacked {
    pub base: Option<Expr>,
    pub elements: Vec<SourceElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceDescriptor {
    /// Grouping literal or fixed-length host sequence
    Tuple(Unpacked),
    /// Small numeric vector, components in index order
    FixedVector(Unpacked),
    /// Integer extents of a field, axis 0 first
    ShapeTuple(Unpacked),
    /// Scalars and matrices: no defined decomposition
    Singular(SourceElement),
    /// Values of a kind the kernel cannot decompose
    Unsupported(SourceElement),
}

impl SourceDescriptor {
    /// Number of values this source provides to a target list.
    pub fn arity(&self) -> usize {
        match self {
            SourceDescriptor::Tuple(u)
            | SourceDescriptor::FixedVector(u)
            | SourceDescriptor::ShapeTuple(u) => u.elements.len(),
            SourceDescriptor::Singular(_) | SourceDescriptor::Unsupported(_) => 1,
        }
    }

    pub fn unpacked(&self) -> Option<&Unpacked> {
        match self {
            SourceDescriptor::Tuple(u)
            | SourceDescriptor::FixedVector(u)
            | SourceDescriptor::ShapeTuple(u) => Some(u),
            SourceDescriptor::Singular(_) | SourceDescriptor::Unsupported(_) => None,
        }
    }

    /// Short description of the source for diagnostics and logs.
    pub fn kind_name(&self) -> String {
        match self {
            SourceDescriptor::Tuple(u) => format!("{}-tuple", u.elements.len()),
            SourceDescriptor::FixedVector(u) => format!("{}-component vector", u.elements.len()),
            SourceDescriptor::ShapeTuple(u) => format!("rank-{} shape", u.elements.len()),
            SourceDescriptor::Singular(e) | SourceDescriptor::Unsupported(e) => e.ty.kind_name(),
        }
    }
}

/// Classify `source`. Fails only when the source itself is ill-typed.
pub fn classify(source: &Expr, ctx: &ResolveContext) -> CompileResult<SourceDescriptor> {
    let span = source.span;
    match &source.kind {
        ExprKind::Tuple(items) => Ok(SourceDescriptor::Tuple(Unpacked {
            base: None,
            elements: items
                .iter()
                .map(|item| element(item.clone(), ctx))
                .collect::<CompileResult<_>>()?,
        })),

        ExprKind::Vector(items) => {
            let ty = type_of(source, ctx)?;
            let elem = ty
                .element_type()
                .ok_or_else(|| CompileError::internal(span, format!("vector typed as {ty}")))?;
            Ok(SourceDescriptor::FixedVector(Unpacked {
                base: None,
                elements: items
                    .iter()
                    .map(|item| SourceElement {
                        expr: item.clone(),
                        ty: elem.into(),
                    })
                    .collect(),
            }))
        }

        ExprKind::ShapeOf(field) => {
            let decl = ctx.field(field).ok_or_else(|| {
                CompileError::new(
                    ErrorKind::UndefinedName,
                    span,
                    format!("undefined field '{field}'"),
                )
            })?;
            Ok(SourceDescriptor::ShapeTuple(Unpacked {
                base: None,
                elements: shape_extents(field, decl, span)?
                    .into_iter()
                    .map(|d| SourceElement {
                        expr: Expr::new(ExprKind::Literal(TypedConstant::i32(d)), span),
                        ty: PrimitiveType::I32.into(),
                    })
                    .collect(),
            }))
        }

        ExprKind::Global(name) => {
            let value = ctx.global(name).ok_or_else(|| {
                CompileError::new(
                    ErrorKind::UndefinedName,
                    span,
                    format!("undefined name '{name}'"),
                )
            })?;
            Ok(match value {
                HostValue::Sequence(items) => SourceDescriptor::Tuple(Unpacked {
                    base: None,
                    elements: items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| host_element(source, i, item, ctx))
                        .collect(),
                }),
                HostValue::Int(_) | HostValue::Float(_) => {
                    SourceDescriptor::Singular(element(source.clone(), ctx)?)
                }
                HostValue::Opaque(what) => SourceDescriptor::Unsupported(SourceElement {
                    expr: source.clone(),
                    ty: DataType::opaque(what.clone()),
                }),
            })
        }

        _ => {
            let ty = type_of(source, ctx)?;
            Ok(match &ty {
                DataType::Vector { n, .. } => {
                    SourceDescriptor::FixedVector(components(source, *n as usize, ctx)?)
                }
                DataType::Tuple(items) => {
                    SourceDescriptor::Tuple(components(source, items.len(), ctx)?)
                }
                DataType::Primitive(_) | DataType::Matrix { .. } => {
                    SourceDescriptor::Singular(SourceElement {
                        expr: source.clone(),
                        ty,
                    })
                }
                DataType::Opaque(_) => SourceDescriptor::Unsupported(SourceElement {
                    expr: source.clone(),
                    ty,
                }),
            })
        }
    }
}

fn element(expr: Expr, ctx: &ResolveContext) -> CompileResult<SourceElement> {
    let ty = type_of(&expr, ctx)?;
    Ok(SourceElement { expr, ty })
}

/// Component reads `base.0 .. base.(n-1)`.
fn components(base: &Expr, n: usize, ctx: &ResolveContext) -> CompileResult<Unpacked> {
    let elements = (0..n)
        .map(|index| {
            element(
                Expr::new(
                    ExprKind::Component {
                        base: Box::new(base.clone()),
                        index,
                    },
                    base.span,
                ),
                ctx,
            )
        })
        .collect::<CompileResult<_>>()?;
    Ok(Unpacked {
        base: Some(base.clone()),
        elements,
    })
}

/// Element `index` of a captured host sequence. Scalars fold to literals.
fn host_element(source: &Expr, index: usize, item: &HostValue, ctx: &ResolveContext) -> SourceElement {
    let ty = ctx.host_value_type(item);
    let kind = match item {
        HostValue::Int(v) => ExprKind::Literal(TypedConstant::int(ctx.options.default_int, *v)),
        HostValue::Float(v) => {
            ExprKind::Literal(TypedConstant::float(ctx.options.default_float, *v))
        }
        HostValue::Sequence(_) | HostValue::Opaque(_) => ExprKind::Component {
            base: Box::new(source.clone()),
            index,
        },
    };
    SourceElement {
        expr: Expr::new(kind, source.span),
        ty,
    }
}

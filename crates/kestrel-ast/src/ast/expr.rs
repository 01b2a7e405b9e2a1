//! Kernel expressions.
//!
//! Expressions are untyped trees as captured from the host language. Types
//! are derived on demand during resolution from the host facts (field
//! declarations, captured globals, function signatures) and local bindings.
//!
//! # Variants
//!
//! - [`ExprKind::Literal`] - typed scalar constant: `2`, `3.5`
//! - [`ExprKind::Local`] - kernel-local variable or parameter
//! - [`ExprKind::Global`] - host value captured by name
//! - [`ExprKind::FieldHandle`] - a field container itself (only meaningful in `static(...)`)
//! - [`ExprKind::FieldElement`] - one slot of a field: `x[None]`, `x[1, 2]`
//! - [`ExprKind::ShapeOf`] - a field's extents: `x.shape`
//! - [`ExprKind::Tuple`] - grouping or list literal: `(a, b)`, `[2, 3, 4]`
//! - [`ExprKind::Vector`] / [`ExprKind::Matrix`] - small numeric value constructors
//! - [`ExprKind::Component`] - one component of a vector or tuple value
//! - [`ExprKind::Binary`] / [`ExprKind::Call`] - arithmetic and host calls

use crate::foundation::{Span, TypedConstant};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Expression node with source location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Literal(TypedConstant),
    Local(String),
    Global(String),
    FieldHandle(String),
    FieldElement {
        field: String,
        /// Compile-time index, empty for rank-0 fields
        index: Vec<i64>,
    },
    ShapeOf(String),
    Tuple(Vec<Expr>),
    Vector(Vec<Expr>),
    /// Row-major rows of a matrix constructor
    Matrix(Vec<Vec<Expr>>),
    Component {
        base: Box<Expr>,
        index: usize,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        func: String,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Whether evaluating this expression may have observable effects.
    ///
    /// Host calls are the only effectful construct; every other node is a
    /// pure read or computation.
    pub fn has_effects(&self) -> bool {
        match &self.kind {
            ExprKind::Call { .. } => true,
            ExprKind::Tuple(items) | ExprKind::Vector(items) => {
                items.iter().any(Expr::has_effects)
            }
            ExprKind::Matrix(rows) => rows.iter().flatten().any(Expr::has_effects),
            ExprKind::Component { base, .. } => base.has_effects(),
            ExprKind::Binary { lhs, rhs, .. } => lhs.has_effects() || rhs.has_effects(),
            ExprKind::Literal(_)
            | ExprKind::Local(_)
            | ExprKind::Global(_)
            | ExprKind::FieldHandle(_)
            | ExprKind::FieldElement { .. }
            | ExprKind::ShapeOf(_) => false,
        }
    }

    /// Calls `f` on every field name this expression mentions, mutably.
    ///
    /// Used by alias substitution to rewrite field references in place.
    pub fn rename_fields(&mut self, f: &mut impl FnMut(&mut String)) {
        match &mut self.kind {
            ExprKind::FieldHandle(field)
            | ExprKind::ShapeOf(field)
            | ExprKind::FieldElement { field, .. } => f(field),
            ExprKind::Tuple(items) | ExprKind::Vector(items) => {
                items.iter_mut().for_each(|e| e.rename_fields(f))
            }
            ExprKind::Matrix(rows) => rows
                .iter_mut()
                .flatten()
                .for_each(|e| e.rename_fields(f)),
            ExprKind::Component { base, .. } => base.rename_fields(f),
            ExprKind::Binary { lhs, rhs, .. } => {
                lhs.rename_fields(f);
                rhs.rename_fields(f);
            }
            ExprKind::Call { args, .. } => args.iter_mut().for_each(|e| e.rename_fields(f)),
            ExprKind::Literal(_) | ExprKind::Local(_) | ExprKind::Global(_) => {}
        }
    }
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_index(f: &mut fmt::Formatter<'_>, index: &[i64]) -> fmt::Result {
    if index.is_empty() {
        return write!(f, "None");
    }
    for (i, v) in index.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{v}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Literal(c) => write!(f, "{c}"),
            ExprKind::Local(name) | ExprKind::Global(name) | ExprKind::FieldHandle(name) => {
                write!(f, "{name}")
            }
            ExprKind::FieldElement { field, index } => {
                write!(f, "{field}[")?;
                write_index(f, index)?;
                write!(f, "]")
            }
            ExprKind::ShapeOf(field) => write!(f, "{field}.shape"),
            ExprKind::Tuple(items) => {
                write!(f, "(")?;
                write_list(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            ExprKind::Vector(items) => {
                write!(f, "Vector([")?;
                write_list(f, items)?;
                write!(f, "])")
            }
            ExprKind::Matrix(rows) => {
                write!(f, "Matrix([")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "[")?;
                    write_list(f, row)?;
                    write!(f, "]")?;
                }
                write!(f, "])")
            }
            ExprKind::Component { base, index } => write!(f, "{base}[{index}]"),
            ExprKind::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            ExprKind::Call { func, args } => {
                write!(f, "{func}(")?;
                write_list(f, args)?;
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::build::*;

    #[test]
    fn test_effects() {
        assert!(!elem("a", &[]).has_effects());
        assert!(!tuple(vec![elem("a", &[]), lit_i32(1)]).has_effects());
        assert!(call("tick", vec![]).has_effects());
        assert!(tuple(vec![lit_i32(1), call("tick", vec![])]).has_effects());
        assert!(add(local("x"), call("tick", vec![])).has_effects());
    }

    #[test]
    fn test_rename_fields() {
        let mut e = tuple(vec![elem("c", &[]), shape_of("c"), local("c")]);
        e.rename_fields(&mut |name| {
            if name == "c" {
                *name = "b".to_string();
            }
        });
        assert_eq!(e.to_string(), "(b[None], b.shape, c)");
    }

    #[test]
    fn test_display() {
        assert_eq!(elem("x", &[1, 2]).to_string(), "x[1, 2]");
        assert_eq!(tuple(vec![lit_i32(2)]).to_string(), "(2_i32,)");
        assert_eq!(
            matrix(vec![vec![lit_i32(2), lit_i32(3)], vec![lit_i32(4), lit_i32(5)]]).to_string(),
            "Matrix([[2_i32, 3_i32], [4_i32, 5_i32]])"
        );
        assert_eq!(add(local("a"), local("b")).to_string(), "(a + b)");
    }
}

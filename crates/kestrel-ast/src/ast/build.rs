//! Shorthand constructors for kernel trees.
//!
//! Frontends that capture host source attach real spans; these helpers are
//! for programmatic kernels and tests, and give every node a detached span.
//!
//! ```
//! use kestrel_ast::ast::build::*;
//!
//! // a[None], b[None] = b[None], a[None]
//! let swap = unpack(
//!     vec![elem_target("a", &[]), elem_target("b", &[])],
//!     tuple(vec![elem("b", &[]), elem("a", &[])]),
//! );
//! # let _ = swap;
//! ```

use super::expr::{BinaryOp, Expr, ExprKind};
use super::stmt::{Stmt, StmtKind, Target, TargetKind};
use crate::foundation::{PrimitiveType, Span, TypedConstant};

fn expr(kind: ExprKind) -> Expr {
    Expr::new(kind, Span::detached())
}

fn stmt(kind: StmtKind) -> Stmt {
    Stmt::new(kind, Span::detached())
}

pub fn lit(c: TypedConstant) -> Expr {
    expr(ExprKind::Literal(c))
}

pub fn lit_i32(v: i32) -> Expr {
    lit(TypedConstant::i32(v))
}

pub fn lit_f32(v: f32) -> Expr {
    lit(TypedConstant::f32(v))
}

pub fn lit_typed(ty: PrimitiveType, v: i64) -> Expr {
    lit(TypedConstant::int(ty, v))
}

pub fn local(name: &str) -> Expr {
    expr(ExprKind::Local(name.to_string()))
}

pub fn global(name: &str) -> Expr {
    expr(ExprKind::Global(name.to_string()))
}

pub fn handle(field: &str) -> Expr {
    expr(ExprKind::FieldHandle(field.to_string()))
}

pub fn elem(field: &str, index: &[i64]) -> Expr {
    expr(ExprKind::FieldElement {
        field: field.to_string(),
        index: index.to_vec(),
    })
}

pub fn shape_of(field: &str) -> Expr {
    expr(ExprKind::ShapeOf(field.to_string()))
}

pub fn tuple(items: Vec<Expr>) -> Expr {
    expr(ExprKind::Tuple(items))
}

pub fn vector(items: Vec<Expr>) -> Expr {
    expr(ExprKind::Vector(items))
}

pub fn matrix(rows: Vec<Vec<Expr>>) -> Expr {
    expr(ExprKind::Matrix(rows))
}

pub fn component(base: Expr, index: usize) -> Expr {
    expr(ExprKind::Component {
        base: Box::new(base),
        index,
    })
}

pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    expr(ExprKind::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

pub fn add(lhs: Expr, rhs: Expr) -> Expr {
    binary(BinaryOp::Add, lhs, rhs)
}

pub fn call(func: &str, args: Vec<Expr>) -> Expr {
    expr(ExprKind::Call {
        func: func.to_string(),
        args,
    })
}

pub fn elem_target(field: &str, index: &[i64]) -> Target {
    Target::new(
        TargetKind::FieldElement {
            field: field.to_string(),
            index: index.to_vec(),
        },
        Span::detached(),
    )
}

pub fn local_target(name: &str) -> Target {
    Target::new(TargetKind::Local(name.to_string()), Span::detached())
}

pub fn assign(target: Target, value: Expr) -> Stmt {
    stmt(StmtKind::Assign { target, value })
}

pub fn unpack(targets: Vec<Target>, source: Expr) -> Stmt {
    stmt(StmtKind::Unpack { targets, source })
}

pub fn static_bind(names: &[&str], sources: Vec<Expr>) -> Stmt {
    stmt(StmtKind::StaticBind {
        names: names.iter().map(|n| n.to_string()).collect(),
        sources,
    })
}

pub fn for_range(var: &str, start: Expr, end: Expr, body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::For {
        var: var.to_string(),
        start,
        end,
        body,
    })
}

pub fn ret(value: Expr) -> Stmt {
    stmt(StmtKind::Return(value))
}

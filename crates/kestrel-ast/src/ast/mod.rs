//! Kernel syntax tree
//!
//! The tree a frontend captures from host source: kernels, statements,
//! assignment targets and untyped expressions.

pub mod build;
pub mod expr;
pub mod stmt;

pub use expr::{BinaryOp, Expr, ExprKind};
pub use stmt::{Kernel, Param, Stmt, StmtKind, Target, TargetKind};

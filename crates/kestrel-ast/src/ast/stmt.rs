//! Kernel statements and kernel definitions.

use super::expr::Expr;
use crate::foundation::{DataType, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A kernel: named parameters, an optional return type and a statement body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kernel {
    pub name: String,
    pub params: Vec<Param>,
    pub ret: Option<DataType>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: DataType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    /// Plain single-target store: `x = e`
    Assign { target: Target, value: Expr },
    /// Destructuring store: `t0, t1, ... = source`
    Unpack { targets: Vec<Target>, source: Expr },
    /// Compile-time alias binding: `c, d = static(b, a)`
    StaticBind { names: Vec<String>, sources: Vec<Expr> },
    /// Serial counted loop: `for var in range(start, end)`
    For {
        var: String,
        start: Expr,
        end: Expr,
        body: Vec<Stmt>,
    },
    Return(Expr),
}

/// Assignment target: a storage location written by a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub kind: TargetKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    /// Field slot at a compile-time index
    FieldElement { field: String, index: Vec<i64> },
    /// Kernel-local variable
    Local(String),
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl Target {
    pub fn new(kind: TargetKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl Kernel {
    pub fn new(name: impl Into<String>, body: Vec<Stmt>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            ret: None,
            body,
            span: Span::detached(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, ty: impl Into<DataType>) -> Self {
        self.params.push(Param {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }

    pub fn returning(mut self, ty: impl Into<DataType>) -> Self {
        self.ret = Some(ty.into());
        self
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TargetKind::Local(name) => write!(f, "{name}"),
            TargetKind::FieldElement { field, index } if index.is_empty() => {
                write!(f, "{field}[None]")
            }
            TargetKind::FieldElement { field, index } => {
                let index: Vec<String> = index.iter().map(i64::to_string).collect();
                write!(f, "{field}[{}]", index.join(", "))
            }
        }
    }
}

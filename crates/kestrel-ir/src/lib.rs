//! # Kestrel IR
//!
//! Lowered form of a kernel: a flat list of instructions over numbered
//! statement-scoped temporaries, plus a reference interpreter that executes
//! it against host field storage.
//!
//! A destructuring statement lowers to two ordered phases:
//!
//! ```text
//! a[None], b[None] = b[None], a[None]
//!
//!   %0 = load b[None]          ; evaluation phase
//!   %1 = load a[None]
//!   store %0 -> a[None]        ; assignment phase
//!   store %1 -> b[None]
//! ```

pub mod interpret;

use kestrel_ast::ast::BinaryOp;
use kestrel_ast::foundation::{DataType, PrimitiveType, TypedConstant};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use interpret::{FieldStorage, HostFunctions, InterpretError, Interpreter, Value};

/// Kernel-local temporary produced by an `Eval` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TempId(pub u32);

/// Storage location written by a `Store`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Place {
    FieldElement { field: String, index: Vec<i64> },
    Local(String),
}

/// Side-effect-free operand tree, except for `Call`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoweredExpr {
    Const(TypedConstant),
    Temp(TempId),
    Load(Place),
    Tuple(Vec<LoweredExpr>),
    Vector(Vec<LoweredExpr>),
    Matrix {
        rows: u8,
        cols: u8,
        elements: Vec<LoweredExpr>,
    },
    Component {
        base: Box<LoweredExpr>,
        index: usize,
    },
    /// Element-wise numeric conversion
    Cast {
        ty: PrimitiveType,
        value: Box<LoweredExpr>,
    },
    Binary {
        op: BinaryOp,
        ty: PrimitiveType,
        lhs: Box<LoweredExpr>,
        rhs: Box<LoweredExpr>,
    },
    Call {
        func: String,
        args: Vec<LoweredExpr>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instr {
    /// Evaluate `value` and bind the result to `dest`
    Eval {
        dest: TempId,
        value: LoweredExpr,
        ty: DataType,
    },
    /// Write a temporary to a place, converting element-wise to `cast` first
    Store {
        src: TempId,
        place: Place,
        cast: Option<PrimitiveType>,
    },
    /// Serial counted loop; `var` is an `i32` local
    Loop {
        var: String,
        start: LoweredExpr,
        end: LoweredExpr,
        body: Vec<Instr>,
    },
    Return(LoweredExpr),
}

/// A fully resolved kernel ready for execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelIr {
    pub name: String,
    pub params: Vec<(String, DataType)>,
    pub ret: Option<DataType>,
    pub body: Vec<Instr>,
    /// Number of temporaries allocated; ids are `0..temp_count`
    pub temp_count: u32,
}

impl KernelIr {
    /// Number of instructions, counting loop bodies.
    pub fn instr_count(&self) -> usize {
        fn count(body: &[Instr]) -> usize {
            body.iter()
                .map(|i| match i {
                    Instr::Loop { body, .. } => 1 + count(body),
                    _ => 1,
                })
                .sum()
        }
        count(&self.body)
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Local(name) => write!(f, "{name}"),
            Place::FieldElement { field, index } if index.is_empty() => {
                write!(f, "{field}[None]")
            }
            Place::FieldElement { field, index } => {
                let index: Vec<String> = index.iter().map(i64::to_string).collect();
                write!(f, "{field}[{}]", index.join(", "))
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[LoweredExpr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for LoweredExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoweredExpr::Const(c) => write!(f, "{c}"),
            LoweredExpr::Temp(t) => write!(f, "{t}"),
            LoweredExpr::Load(place) => write!(f, "load {place}"),
            LoweredExpr::Tuple(items) => {
                write!(f, "(")?;
                write_list(f, items)?;
                write!(f, ")")
            }
            LoweredExpr::Vector(items) => {
                write!(f, "vec[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
            LoweredExpr::Matrix {
                rows,
                cols,
                elements,
            } => {
                write!(f, "mat{rows}x{cols}[")?;
                write_list(f, elements)?;
                write!(f, "]")
            }
            LoweredExpr::Component { base, index } => write!(f, "{base}.{index}"),
            LoweredExpr::Cast { ty, value } => write!(f, "cast<{ty}>({value})"),
            LoweredExpr::Binary { op, ty, lhs, rhs } => {
                write!(f, "{}.{ty}({lhs}, {rhs})", op.symbol())
            }
            LoweredExpr::Call { func, args } => {
                write!(f, "call {func}(")?;
                write_list(f, args)?;
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for KernelIr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_body(f: &mut fmt::Formatter<'_>, body: &[Instr], depth: usize) -> fmt::Result {
            let pad = "  ".repeat(depth);
            for instr in body {
                match instr {
                    Instr::Eval { dest, value, ty } => {
                        writeln!(f, "{pad}{dest}: {ty} = {value}")?
                    }
                    Instr::Store {
                        src,
                        place,
                        cast: Some(to),
                    } => writeln!(f, "{pad}store cast<{to}>({src}) -> {place}")?,
                    Instr::Store {
                        src,
                        place,
                        cast: None,
                    } => writeln!(f, "{pad}store {src} -> {place}")?,
                    Instr::Loop {
                        var,
                        start,
                        end,
                        body,
                    } => {
                        writeln!(f, "{pad}for {var} in {start}..{end} {{")?;
                        write_body(f, body, depth + 1)?;
                        writeln!(f, "{pad}}}")?;
                    }
                    Instr::Return(value) => writeln!(f, "{pad}return {value}")?,
                }
            }
            Ok(())
        }

        writeln!(f, "kernel {} {{", self.name)?;
        write_body(f, &self.body, 1)?;
        write!(f, "}}")
    }
}

//! Facts supplied by the embedding host program.
//!
//! Kernels are compiled against declarations that live outside the kernel
//! body: field containers allocated by the host, host values captured by
//! name, and host functions the kernel may call.

use super::{DataType, PrimitiveType, Shape};
use serde::{Deserialize, Serialize};

/// Declaration of a field container: its slot type and extents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Type stored in every slot
    pub element: DataType,
    /// Per-axis extents
    pub shape: Shape,
}

/// A host value captured by name when a kernel is compiled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostValue {
    Int(i64),
    Float(f64),
    /// Fixed-length host sequence (list or tuple)
    Sequence(Vec<HostValue>),
    /// Host object the kernel language cannot represent
    Opaque(String),
}

/// Signature of a host function callable from kernels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSig {
    pub params: Vec<DataType>,
    pub ret: DataType,
}

impl FieldDecl {
    pub fn new(element: impl Into<DataType>, shape: impl Into<Shape>) -> Self {
        Self {
            element: element.into(),
            shape: shape.into(),
        }
    }

    /// Rank-0 field of primitive slots.
    pub fn scalar(ty: PrimitiveType) -> Self {
        Self::new(ty, Shape::scalar())
    }
}

impl HostValue {
    /// Description used when the value cannot be represented in a kernel.
    pub fn describe(&self) -> String {
        match self {
            HostValue::Int(_) => "host int".to_string(),
            HostValue::Float(_) => "host float".to_string(),
            HostValue::Sequence(items) => format!("host sequence of length {}", items.len()),
            HostValue::Opaque(what) => what.clone(),
        }
    }
}

impl FunctionSig {
    pub fn new(params: Vec<DataType>, ret: impl Into<DataType>) -> Self {
        Self {
            params,
            ret: ret.into(),
        }
    }
}

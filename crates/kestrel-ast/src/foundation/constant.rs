//! Compile-time constants tagged with their primitive type.

use super::types::PrimitiveType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar constant and the primitive type it was produced at.
///
/// The payload is always normalized for `ty`: integers are wrapped to the
/// type's width and floats are rounded to its precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypedConstant {
    pub ty: PrimitiveType,
    pub value: ConstValue,
}

/// Raw constant payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConstValue {
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl TypedConstant {
    /// Integer constant of type `ty`, converted the way a store would.
    pub fn int(ty: PrimitiveType, v: i64) -> Self {
        Self::from_parts(ty, ConstValue::Int(v))
    }

    /// Float constant of type `ty`, converted the way a store would.
    pub fn float(ty: PrimitiveType, v: f64) -> Self {
        Self::from_parts(ty, ConstValue::Float(v))
    }

    pub fn i32(v: i32) -> Self {
        Self::int(PrimitiveType::I32, v as i64)
    }

    pub fn i64(v: i64) -> Self {
        Self::int(PrimitiveType::I64, v)
    }

    pub fn f32(v: f32) -> Self {
        Self::float(PrimitiveType::F32, v as f64)
    }

    pub fn f64(v: f64) -> Self {
        Self::float(PrimitiveType::F64, v)
    }

    /// Zero of type `ty`.
    pub fn zero(ty: PrimitiveType) -> Self {
        Self::int(ty, 0)
    }

    fn from_parts(ty: PrimitiveType, raw: ConstValue) -> Self {
        let value = if ty.is_real() {
            let v = match raw {
                ConstValue::Int(i) => i as f64,
                ConstValue::UInt(u) => u as f64,
                ConstValue::Float(f) => f,
            };
            ConstValue::Float(round_to(ty, v))
        } else {
            let bits = match raw {
                ConstValue::Int(i) => i as u64,
                ConstValue::UInt(u) => u,
                ConstValue::Float(f) => (f.trunc() as i64) as u64,
            };
            wrap_integer(ty, bits)
        };
        Self { ty, value }
    }

    /// Convert to another primitive type with store semantics.
    pub fn cast(self, ty: PrimitiveType) -> Self {
        if ty == self.ty {
            self
        } else {
            Self::from_parts(ty, self.value)
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self.value {
            ConstValue::Int(i) => i as f64,
            ConstValue::UInt(u) => u as f64,
            ConstValue::Float(f) => f,
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self.value {
            ConstValue::Int(i) => i,
            ConstValue::UInt(u) => u as i64,
            ConstValue::Float(f) => f.trunc() as i64,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_f64() == 0.0
    }
}

fn round_to(ty: PrimitiveType, v: f64) -> f64 {
    match ty {
        PrimitiveType::F16 | PrimitiveType::F32 => v as f32 as f64,
        _ => v,
    }
}

fn wrap_integer(ty: PrimitiveType, bits: u64) -> ConstValue {
    if ty == PrimitiveType::U1 {
        return ConstValue::UInt(u64::from(bits != 0));
    }
    let width = ty.bits();
    if ty.is_signed() {
        let shift = 64 - width;
        ConstValue::Int(((bits << shift) as i64) >> shift)
    } else if width == 64 {
        ConstValue::UInt(bits)
    } else {
        ConstValue::UInt(bits & ((1u64 << width) - 1))
    }
}

impl fmt::Display for TypedConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            ConstValue::Int(i) => write!(f, "{i}"),
            ConstValue::UInt(u) => write!(f, "{u}"),
            ConstValue::Float(v) => write!(f, "{v:?}"),
        }?;
        write!(f, "_{}", self.ty)
    }
}

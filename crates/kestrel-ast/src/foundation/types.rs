//! Static types of kernel values.
//!
//! Every storage slot and every expression in a kernel has a [`DataType`]:
//!
//! - **Primitive** - fixed-width integer or float scalars ([`PrimitiveType`])
//! - **Vector** - small fixed-size numeric vector with a primitive element type
//! - **Matrix** - fixed-size rows × cols numeric matrix
//! - **Tuple** - compile-time grouping of heterogeneous values (never stored)
//! - **Opaque** - a value whose structure is unknown to the compiler
//!
//! Store compatibility follows ordinary scalar assignment semantics: any
//! primitive converts to any other primitive (with an implicit cast), and
//! vectors/matrices convert element-wise when their dimensions agree.
//!
//! # Examples
//!
//! ```
//! # use kestrel_ast::foundation::types::*;
//! let f32_ty = DataType::Primitive(PrimitiveType::F32);
//! let i32_ty = DataType::Primitive(PrimitiveType::I32);
//! assert!(i32_ty.assignable_to(&f32_ty));
//!
//! let vec3 = DataType::vector(PrimitiveType::I32, 3);
//! assert!(!vec3.assignable_to(&f32_ty));
//! assert_eq!(PrimitiveType::I32.promote(PrimitiveType::F32), PrimitiveType::F32);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-width scalar types supported by storage and arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    U1,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F16,
    F32,
    F64,
}

/// Static type of a kernel value or storage slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Scalar of a primitive type
    Primitive(PrimitiveType),
    /// Fixed-size numeric vector
    Vector {
        /// Component type
        elem: PrimitiveType,
        /// Number of components
        n: u8,
    },
    /// Fixed-size two-dimensional matrix
    Matrix {
        /// Component type
        elem: PrimitiveType,
        /// Number of rows
        rows: u8,
        /// Number of columns
        cols: u8,
    },
    /// Compile-time grouping of values
    Tuple(Vec<DataType>),
    /// Value of unknown structure, with a description of what it is
    Opaque(String),
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 12] = [
        PrimitiveType::U1,
        PrimitiveType::I8,
        PrimitiveType::I16,
        PrimitiveType::I32,
        PrimitiveType::I64,
        PrimitiveType::U8,
        PrimitiveType::U16,
        PrimitiveType::U32,
        PrimitiveType::U64,
        PrimitiveType::F16,
        PrimitiveType::F32,
        PrimitiveType::F64,
    ];

    pub fn bits(self) -> u32 {
        match self {
            PrimitiveType::U1 => 1,
            PrimitiveType::I8 | PrimitiveType::U8 => 8,
            PrimitiveType::I16 | PrimitiveType::U16 | PrimitiveType::F16 => 16,
            PrimitiveType::I32 | PrimitiveType::U32 | PrimitiveType::F32 => 32,
            PrimitiveType::I64 | PrimitiveType::U64 | PrimitiveType::F64 => 64,
        }
    }

    pub fn is_real(self) -> bool {
        matches!(
            self,
            PrimitiveType::F16 | PrimitiveType::F32 | PrimitiveType::F64
        )
    }

    pub fn is_integral(self) -> bool {
        !self.is_real()
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            PrimitiveType::I8
                | PrimitiveType::I16
                | PrimitiveType::I32
                | PrimitiveType::I64
                | PrimitiveType::F16
                | PrimitiveType::F32
                | PrimitiveType::F64
        )
    }

    /// Result type of a binary arithmetic operation.
    ///
    /// Floats win over integers; among floats the wider wins, and an integer
    /// meeting `f16` promotes to `f32`. Among integers the wider wins and the
    /// result is signed if either operand is.
    pub fn promote(self, other: PrimitiveType) -> PrimitiveType {
        match (self.is_real(), other.is_real()) {
            (true, true) => {
                if self.bits() >= other.bits() {
                    self
                } else {
                    other
                }
            }
            (true, false) | (false, true) => {
                let real = if self.is_real() { self } else { other };
                if real == PrimitiveType::F16 {
                    PrimitiveType::F32
                } else {
                    real
                }
            }
            (false, false) => {
                let bits = self.bits().max(other.bits());
                let signed = self.is_signed() || other.is_signed();
                PrimitiveType::integer(bits, signed)
            }
        }
    }

    /// Integer type with at least `bits` width.
    pub fn integer(bits: u32, signed: bool) -> PrimitiveType {
        match (bits, signed) {
            (0..=1, false) => PrimitiveType::U1,
            (0..=8, true) => PrimitiveType::I8,
            (0..=8, false) => PrimitiveType::U8,
            (9..=16, true) => PrimitiveType::I16,
            (9..=16, false) => PrimitiveType::U16,
            (17..=32, true) => PrimitiveType::I32,
            (17..=32, false) => PrimitiveType::U32,
            (_, true) => PrimitiveType::I64,
            (_, false) => PrimitiveType::U64,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::U1 => "u1",
            PrimitiveType::I8 => "i8",
            PrimitiveType::I16 => "i16",
            PrimitiveType::I32 => "i32",
            PrimitiveType::I64 => "i64",
            PrimitiveType::U8 => "u8",
            PrimitiveType::U16 => "u16",
            PrimitiveType::U32 => "u32",
            PrimitiveType::U64 => "u64",
            PrimitiveType::F16 => "f16",
            PrimitiveType::F32 => "f32",
            PrimitiveType::F64 => "f64",
        }
    }
}

impl DataType {
    pub fn vector(elem: PrimitiveType, n: u8) -> Self {
        DataType::Vector { elem, n }
    }

    pub fn matrix(elem: PrimitiveType, rows: u8, cols: u8) -> Self {
        DataType::Matrix { elem, rows, cols }
    }

    pub fn opaque(what: impl Into<String>) -> Self {
        DataType::Opaque(what.into())
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            DataType::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    /// Component type for numeric values (scalar, vector, matrix).
    pub fn element_type(&self) -> Option<PrimitiveType> {
        match self {
            DataType::Primitive(p) => Some(*p),
            DataType::Vector { elem, .. } | DataType::Matrix { elem, .. } => Some(*elem),
            DataType::Tuple(_) | DataType::Opaque(_) => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, DataType::Primitive(_))
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, DataType::Matrix { .. })
    }

    /// Whether a value of this type may be stored into a slot of `target`.
    ///
    /// Tuples and opaque values are never storable.
    pub fn assignable_to(&self, target: &DataType) -> bool {
        match (self, target) {
            (DataType::Primitive(_), DataType::Primitive(_)) => true,
            (DataType::Vector { n: a, .. }, DataType::Vector { n: b, .. }) => a == b,
            (
                DataType::Matrix {
                    rows: r1, cols: c1, ..
                },
                DataType::Matrix {
                    rows: r2, cols: c2, ..
                },
            ) => r1 == r2 && c1 == c2,
            _ => false,
        }
    }

    /// Short description of the value kind, used in diagnostics.
    pub fn kind_name(&self) -> String {
        match self {
            DataType::Primitive(_) => "scalar".to_string(),
            DataType::Vector { n, .. } => format!("{n}-component vector"),
            DataType::Matrix { rows, cols, .. } => format!("{rows}x{cols} matrix"),
            DataType::Tuple(items) => format!("{}-tuple", items.len()),
            DataType::Opaque(what) => what.clone(),
        }
    }
}

impl From<PrimitiveType> for DataType {
    fn from(p: PrimitiveType) -> Self {
        DataType::Primitive(p)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Primitive(p) => write!(f, "{p}"),
            DataType::Vector { elem, n } => write!(f, "vector<{elem}, {n}>"),
            DataType::Matrix { elem, rows, cols } => write!(f, "matrix<{elem}, {rows}x{cols}>"),
            DataType::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            DataType::Opaque(what) => write!(f, "<{what}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PrimitiveType::*;

    #[test]
    fn test_promotion() {
        assert_eq!(I32.promote(I32), I32);
        assert_eq!(I32.promote(I64), I64);
        assert_eq!(U8.promote(I8), I8);
        assert_eq!(U16.promote(I8), I16);
        assert_eq!(U32.promote(U64), U64);
        assert_eq!(I32.promote(F32), F32);
        assert_eq!(F64.promote(I8), F64);
        assert_eq!(F16.promote(I32), F32);
        assert_eq!(F16.promote(F64), F64);
        assert_eq!(U1.promote(U1), U1);
    }

    #[test]
    fn test_promotion_is_symmetric() {
        for a in PrimitiveType::ALL {
            for b in PrimitiveType::ALL {
                assert_eq!(a.promote(b), b.promote(a), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_scalar_assignability_allows_narrowing() {
        let f32_ty = DataType::from(F32);
        let u8_ty = DataType::from(U8);
        assert!(f32_ty.assignable_to(&u8_ty));
        assert!(u8_ty.assignable_to(&f32_ty));
    }

    #[test]
    fn test_compound_assignability() {
        let v3 = DataType::vector(I32, 3);
        let v3f = DataType::vector(F32, 3);
        let v2 = DataType::vector(F32, 2);
        let m22 = DataType::matrix(F32, 2, 2);

        assert!(v3.assignable_to(&v3f));
        assert!(!v3.assignable_to(&v2));
        assert!(!v3.assignable_to(&DataType::from(F32)));
        assert!(!DataType::from(F32).assignable_to(&v3));
        assert!(m22.assignable_to(&DataType::matrix(I32, 2, 2)));
        assert!(!m22.assignable_to(&DataType::vector(F32, 4)));
        assert!(!DataType::Tuple(vec![]).assignable_to(&DataType::Tuple(vec![])));
        assert!(!DataType::opaque("object").assignable_to(&DataType::from(F32)));
    }

    #[test]
    fn test_display() {
        assert_eq!(DataType::from(F32).to_string(), "f32");
        assert_eq!(DataType::vector(I32, 3).to_string(), "vector<i32, 3>");
        assert_eq!(DataType::matrix(F64, 2, 3).to_string(), "matrix<f64, 2x3>");
        assert_eq!(
            DataType::Tuple(vec![I32.into(), F32.into()]).to_string(),
            "(i32, f32)"
        );
        assert_eq!(DataType::Tuple(vec![I32.into()]).to_string(), "(i32,)");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(DataType::matrix(F32, 2, 2).kind_name(), "2x2 matrix");
        assert_eq!(DataType::vector(F32, 3).kind_name(), "3-component vector");
        assert_eq!(DataType::opaque("host object").kind_name(), "host object");
    }
}

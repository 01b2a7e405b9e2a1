//! Compiler foundation types
//!
//! Source locations, the static type system, field extents and the facts a
//! host program supplies when it compiles a kernel.

pub mod constant;
pub mod host;
pub mod shape;
pub mod span;
pub mod types;

pub use constant::{ConstValue, TypedConstant};
pub use host::{FieldDecl, FunctionSig, HostValue};
pub use shape::Shape;
pub use span::{SourceFile, SourceMap, Span};
pub use types::{DataType, PrimitiveType};

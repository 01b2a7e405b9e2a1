//! # Kestrel AST
//!
//! Foundation types, the kernel syntax tree and compile diagnostics shared by
//! every stage of the Kestrel kernel compiler.
//!
//! ```text
//! kestrel-ast       - foundation + AST + diagnostics
//!     ↓
//! kestrel-ir        - lowered IR + reference interpreter
//!     ↓
//! kestrel-resolve   - alias resolution, destructuring, lowering
//!     ↓
//! kestrel (facade)  - Program API
//! ```

pub mod ast;
pub mod error;
pub mod foundation;

pub use error::{CompileError, CompileResult, DiagnosticFormatter, ErrorDetail, ErrorKind, Severity};
pub use foundation::{
    DataType, FieldDecl, FunctionSig, HostValue, PrimitiveType, Shape, SourceMap, Span,
    TypedConstant,
};

//! # Kestrel
//!
//! Ahead-of-time kernel compiler with destructuring assignment.
//!
//! This crate is a facade over the compiler's sub-crates:
//!
//! ```text
//! kestrel-ast       - foundation types, kernel AST, diagnostics
//!     ↓
//! kestrel-ir        - lowered IR + reference interpreter
//!     ↓
//! kestrel-resolve   - alias resolution, typing, destructuring, lowering
//!     ↓
//! kestrel (facade)  - re-exports, compile API, Program
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kestrel::ast::build::*;
//! use kestrel::{FieldDecl, Kernel, PrimitiveType, Program};
//!
//! let mut program = Program::new();
//! program.add_field("a", FieldDecl::scalar(PrimitiveType::F32))?;
//! program.add_field("b", FieldDecl::scalar(PrimitiveType::F32))?;
//!
//! // a[None], b[None] = b[None], a[None]
//! let swap = Kernel::new("swap", vec![unpack(
//!     vec![elem_target("a", &[]), elem_target("b", &[])],
//!     tuple(vec![elem("b", &[]), elem("a", &[])]),
//! )]);
//! program.launch(&swap, &[])?;
//! ```

pub mod compile;
pub mod logging;
pub mod program;

// Re-export AST, foundation and diagnostics
pub use kestrel_ast::ast::{Kernel, Stmt, Target};
pub use kestrel_ast::*;

// Re-export IR and runtime
pub use kestrel_ir as ir;
pub use kestrel_ir::{FieldStorage, HostFunctions, InterpretError, KernelIr, Value};

// Re-export resolve
pub use kestrel_resolve as resolve;
pub use kestrel_resolve::{ConfigError, DiagnosticPolicy, HostFacts, ResolveOptions};

pub use compile::{compile_kernel, deserialize_kernel, format_errors, serialize_kernel};
pub use logging::init_logging;
pub use program::{Program, ProgramError};

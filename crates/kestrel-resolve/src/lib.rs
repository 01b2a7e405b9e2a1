// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Resolution and lowering for Kestrel kernels
//!
//! This crate turns a kernel [`Kernel`](kestrel_ast::ast::Kernel) tree into
//! [`KernelIr`](kestrel_ir::KernelIr): compile-time field aliases are
//! substituted, every expression is typed against the host's fields, globals
//! and functions, and destructuring assignments are expanded into ordered
//! evaluate-then-store sequences.

pub mod config;
pub mod resolve;

pub use config::{ConfigError, DiagnosticPolicy, ResolveOptions};
pub use resolve::*;

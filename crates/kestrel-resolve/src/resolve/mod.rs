//! Kernel resolution passes.
//!
//! ```text
//! Kernel AST
//!     ↓ alias       static field aliases substituted, bind statements removed
//!     ↓ pipeline    statements visited in order with a growing local scope
//!         ↓ typing      static type of every expression
//!         ↓ unpack      collect → classify → validate → sequence
//!         ↓ lower       expressions become IR operands
//! KernelIr
//! ```

pub mod alias;
pub mod context;
pub mod diagnostics;
pub mod lower;
pub mod pipeline;
pub mod typing;
pub mod unpack;

pub use alias::resolve_aliases;
pub use context::{HostFacts, ResolveContext};
pub use diagnostics::Diagnostics;
pub use pipeline::resolve_kernel;
pub use typing::type_of;
pub use unpack::{resolve_assign, resolve_unpack, Resolution, TempAllocator};

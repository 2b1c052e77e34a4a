//! Dataflow IR
//!
//! The operator-level graph the partitioner consumes and produces:
//!
//! - [`Op`]: closed operator vocabulary
//! - [`Node`]/[`NodeKind`]: `Var`, `Constant`, `Call`, `TupleGetItem`
//! - [`Function`]: topologically ordered node arena
//! - [`IrModule`]: named functions with a `main` entry
//!
//! # Overview
//!
//! Node ids are arena indices, so a function can be read without any
//! pointer chasing and rewritten into a fresh arena deterministically.

pub mod attrs;
pub mod function;
pub mod module;
pub mod node;
pub mod op;
pub mod types;

// Re-export main types
pub use attrs::{get_attr_i, get_attr_ints, get_attr_s, AttrValue, Attrs};
pub use function::{Function, FunctionAttrs};
pub use module::{IrModule, ENTRY};
pub use node::{Args, Call, Callee, Node, NodeId, NodeKind};
pub use op::Op;
pub use types::{TensorType, Type};

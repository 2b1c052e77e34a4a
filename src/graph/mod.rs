//! Graph analysis over a single function
//!
//! This module provides the read-only infrastructure the matcher, the
//! legality predicates and the partitioner share:
//!
//! - [`GraphContext`]: borrowed view with O(1) consumer lookups
//! - [`maps`]: type definitions and builders for graph maps
//! - [`traversal`]: backward DFS and dependency checks
//!
//! # Example
//!
//! ```ignore
//! use rvx_partition::graph::GraphContext;
//!
//! let ctx = GraphContext::new(module.main()?);
//!
//! // Typed access, fails with MissingTypeInfo before inference
//! let ty = ctx.tensor_type(node, "qnn.conv2d input")?;
//!
//! // Relationships
//! if ctx.is_single_use(node) {
//!     // value never escapes its consumer
//! }
//! ```
//!
//! # Maps
//!
//! | Map | Description |
//! |-----|-------------|
//! | `consumer_map` | node → distinct consumer nodes |
//! | `use_count_map` | node → number of argument slots reading it |

pub mod context;
pub mod maps;
pub mod traversal;

// Re-export main types
pub use context::GraphContext;
pub use maps::{ConsumerMap, UseCountMap};
pub use traversal::{depends_on_any, DfsIterator};

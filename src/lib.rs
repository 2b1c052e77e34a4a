//! # RVX Partition
//!
//! Pattern-based subgraph partitioning of quantized tensor IR for the RVX
//! accelerator.
//!
//! This crate finds the subgraphs of an operator graph the accelerator can
//! execute, checks that their dtypes and zero points are supported, and
//! extracts each one into a composite function tagged for the accelerator.
//!
//! ## Features
//!
//! - **Pattern Matching**: A small algebra of wildcard, constant, operator,
//!   alternation and optional-layer patterns
//! - **Legality Checking**: dtype allow-list, zero-point and depthwise rules
//! - **Partitioning**: Annotation, connected components, extraction and
//!   type re-validation
//!
//! ## Example
//!
//! ```ignore
//! use rvx_partition::prelude::*;
//!
//! let typed = infer_module(&module)?;
//! let partitioned = partition(&typed, None, "default")?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// ============================================================================
// Module declarations
// ============================================================================

pub mod builder;
pub mod error;
pub mod graph;
pub mod infer;
pub mod ir;
pub mod legality;
pub mod pattern;
pub mod tensor;
pub mod traits;
pub mod transform;

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Prelude module - import commonly used types with `use rvx_partition::prelude::*`
pub mod prelude {
    pub use crate::builder::{Conv2dAttrs, GraphBuilder};
    pub use crate::error::{PartitionError, PartitionResult};
    pub use crate::graph::GraphContext;
    pub use crate::infer::infer_module;
    pub use crate::ir::{Function, IrModule, NodeId, Op, Type};
    pub use crate::pattern::{
        build_pattern_table, build_uma_pattern_table, PatternEntry, PatternMatcher, PatternTable,
    };
    pub use crate::tensor::{DType, TensorData};
    pub use crate::traits::{Pass, PassChain};
    pub use crate::transform::{
        bind_params_by_name, partition, partition_with, InferType, Params, PartitionConfig,
        PartitionGraph, PartitionStats,
    };
}

// ============================================================================
// Crate-level re-exports
// ============================================================================

pub use error::{PartitionError, PartitionResult};
pub use pattern::build_pattern_table;
pub use traits::Pass;
pub use transform::{partition, partition_with};

// ============================================================================
// Version information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default accelerator target name
pub const DEFAULT_TARGET: &str = "rvx";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_target() {
        assert_eq!(transform::PartitionConfig::default().target, DEFAULT_TARGET);
    }
}

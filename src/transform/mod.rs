//! Partitioning transformations
//!
//! This module turns a typed module into one where offloadable subgraphs
//! live in their own functions:
//!
//! - [`params`]: binding named parameters to constants
//! - [`merge`]: per-anchor pattern selection
//! - [`annotate`]: region tags and boundary edges
//! - [`components`]: same-tag connected components
//! - [`extract`]: building partition functions and rewriting the host
//! - [`eliminate`]: dropping dead host nodes
//! - [`verify`]: re-inference and type comparison
//!
//! # Overview
//!
//! A partition run never mutates its input. The typical workflow is:
//!
//! 1. Run type inference ([`InferType`])
//! 2. Call [`partition`] (or [`partition_with`] for a custom table)
//! 3. Hand the `compiler`-tagged functions to a code generator
//!
//! # Example
//!
//! ```ignore
//! use rvx_partition::transform::{partition_pipeline, PartitionConfig, Params};
//! use rvx_partition::traits::Pass;
//!
//! let mut params = Params::new();
//! params.insert("weight".to_string(), weights);
//!
//! let pipeline = partition_pipeline(params, PartitionConfig::default())?;
//! let partitioned = pipeline.run(module)?;
//!
//! for name in partitioned.partitions_for("rvx") {
//!     println!("{name}");
//! }
//! ```
//!
//! # Pass Equivalence
//!
//! | Pass | Rust Equivalent |
//! |------|-----------------|
//! | `bind_params_by_name` | [`bind_params_by_name`] / [`BindParams`] |
//! | `InferType` | [`InferType`] |
//! | `MergeComposite` | [`merge_composite`] |
//! | `AnnotateTarget` | [`annotate()`] |
//! | `PartitionGraph` | [`PartitionGraph`] / [`partition_with`] |

pub mod annotate;
pub mod components;
pub mod core;
pub mod eliminate;
pub mod extract;
pub mod merge;
pub mod params;
pub mod verify;

// Re-export main types and functions
pub use self::core::{
    partition, partition_pipeline, partition_with, InferType, PartitionConfig, PartitionGraph,
    PartitionStats,
};
pub use annotate::{annotate, Annotation, Boundary, RegionTag};
pub use components::{connected_components, Component, UnionFind};
pub use eliminate::{eliminate_dead_nodes, EliminationResult};
pub use extract::{build_partition_function, rewrite_host, BoundarySignature, Partition};
pub use merge::{merge_composite, structural_conflict, AcceptedMatch, AnchorState, StructuralConflict};
pub use params::{bind_params_by_name, BindParams, Params};
pub use verify::verify_partitioned;

pub use crate::traits::{Pass, PassChain};

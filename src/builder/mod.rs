//! Graph builder module
//!
//! This module provides utilities for constructing IR functions:
//!
//! - [`GraphBuilder`]: Fluent builder that appends nodes in topological order
//! - [`qnn`]: Constructors for the quantized operators with full attribute sets
//!
//! # Example
//!
//! ```ignore
//! use rvx_partition::builder::{Conv2dAttrs, GraphBuilder};
//!
//! let mut b = GraphBuilder::new();
//! let data = b.var("data", Type::tensor(DType::Int8, vec![1, 32, 32, 8]));
//! let weight = b.constant(zeros(DType::Int8, &[3, 3, 8, 16])?);
//! let zp = b.constant(scalar_i32(0));
//! let scale = b.constant(scalar_f32(0.078));
//! let conv = b.qnn_conv2d(data, weight, zp, zp, scale, scale,
//!     &Conv2dAttrs::nhwc().out_dtype(DType::Int32))?;
//! let module = b.finish_module(conv)?;
//! ```

pub mod graph;
pub mod qnn;

// Re-export main types
pub use graph::GraphBuilder;
pub use qnn::Conv2dAttrs;

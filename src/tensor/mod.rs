//! Tensor utilities
//!
//! This module provides utilities for working with tensors in the IR:
//! - Data types (`dtype`)
//! - Shape and layout helpers (`shape`)
//! - Constant payloads with typed extraction (`convert`)
//!
//! # Example
//!
//! ```ignore
//! use rvx_partition::tensor::{vec_i32, DType};
//!
//! let kernel_zp = vec_i32(&[0, 0, 0, 0]);
//! assert_eq!(kernel_zp.dtype(), DType::Int32);
//! assert!(kernel_zp.to_vec_i64()?.iter().all(|&zp| zp == 0));
//! ```

pub mod convert;
pub mod dtype;
pub mod shape;

// Re-export commonly used items
pub use convert::{
    filled_i32, filled_i64, filled_i8, scalar_f32, scalar_i32, vec_i32, zeros, TensorData,
};
pub use dtype::DType;
pub use shape::{check_layout, conv_out_dim, dim_of, expand_padding, layout_index, numel};

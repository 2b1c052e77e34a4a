//! Accelerator legality predicates
//!
//! A structural match only says the subgraph has the right shape. The
//! predicates here decide whether the accelerator can run it:
//!
//! - [`dtypes`]: the `(input, weight, bias, accumulator, output)` allow-list
//! - [`zero_point`]: input and kernel zero-point constraints
//! - [`chain`]: walking a `[clip] -> requantize -> [bias_add] -> core` match
//! - [`conv2d`] / [`dense`]: the per-composite predicates
//!
//! A predicate returning `false` is the ordinary outcome for a candidate the
//! accelerator cannot run. Errors mean a broken precondition, typically a
//! node without a checked type.

pub mod chain;
pub mod conv2d;
pub mod dense;
pub mod dtypes;
pub mod zero_point;

// Re-export main types
pub use chain::QnnChain;
pub use conv2d::{check_qnn_conv2d, is_depthwise};
pub use dense::check_qnn_dense;
pub use dtypes::{check_dtype_tuple, default_bias_dtype, DtypeTuple};
pub use zero_point::{input_zero_point_ok, kernel_zero_point_scalar_zero, kernel_zero_points_all_zero};

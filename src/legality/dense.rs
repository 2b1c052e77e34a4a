//! `qnn.dense` legality
//!
//! Same dtype allow-list as conv2d. Only the first kernel zero point is
//! inspected and there is no depthwise case.

use tracing::debug;

use crate::error::PartitionResult;
use crate::graph::GraphContext;
use crate::ir::{NodeId, Op};

use super::chain::QnnChain;
use super::dtypes::check_dtype_tuple;
use super::zero_point::kernel_zero_point_scalar_zero;

/// Legality predicate of the `qnn_fully_connected` composite
#[tracing::instrument(level = "trace", skip(ctx))]
pub fn check_qnn_dense(ctx: &GraphContext<'_>, root: NodeId) -> PartitionResult<bool> {
    let Some(chain) = QnnChain::unwrap(ctx, root, &Op::QnnDense) else {
        debug!(%root, "not a requantized qnn.dense chain");
        return Ok(false);
    };

    let tuple = chain.dtype_tuple(ctx)?;
    if !check_dtype_tuple(&tuple) {
        debug!(%root, %tuple, "unsupported dtype combination");
        return Ok(false);
    }
    if !kernel_zero_point_scalar_zero(ctx, chain.core) {
        debug!(%root, "nonzero kernel zero point");
        return Ok(false);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::infer::infer_function_standalone;
    use crate::ir::{Function, Type};
    use crate::tensor::{filled_i8, scalar_f32, scalar_i32, DType};

    fn make_dense(kernel_zp: i32, out: DType) -> (Function, NodeId) {
        let mut b = GraphBuilder::new();
        let x = b.var("x", Type::tensor(DType::Int8, vec![1, 16]));
        let w = b.constant(filled_i8(&[4, 16], 1));
        let izp = b.constant(scalar_i32(7));
        let kzp = b.constant(scalar_i32(kernel_zp));
        let s = b.constant(scalar_f32(0.1));
        let fc = b.qnn_dense(x, w, izp, kzp, s, s, 4, DType::Int32).unwrap();
        let rq = b.requantize(fc, s, izp, s, izp, out).unwrap();
        let f = infer_function_standalone(&b.finish(rq).unwrap()).unwrap();
        (f, rq)
    }

    #[test]
    fn test_accepts_zero_kernel_zero_point() {
        let (f, root) = make_dense(0, DType::Int8);
        assert!(check_qnn_dense(&GraphContext::new(&f), root).unwrap());
    }

    #[test]
    fn test_rejects_nonzero_kernel_zero_point() {
        let (f, root) = make_dense(3, DType::Int8);
        assert!(!check_qnn_dense(&GraphContext::new(&f), root).unwrap());
    }

    #[test]
    fn test_rejects_wrong_output_dtype() {
        let (f, root) = make_dense(0, DType::Int16);
        assert!(!check_qnn_dense(&GraphContext::new(&f), root).unwrap());
    }
}

//! `qnn.conv2d` legality
//!
//! A matched `[clip] -> requantize -> [bias_add] -> qnn.conv2d` chain is
//! offloadable when
//!
//! 1. its dtype tuple is on the allow-list,
//! 2. an `int16` input has a zero input zero point,
//! 3. every kernel zero point is zero, and
//! 4. a depthwise convolution carries a bias.

use tracing::debug;

use crate::error::PartitionResult;
use crate::graph::GraphContext;
use crate::ir::{get_attr_i, get_attr_s, NodeId, Op};
use crate::tensor::dim_of;

use super::chain::QnnChain;
use super::dtypes::check_dtype_tuple;
use super::zero_point::{input_zero_point_ok, kernel_zero_points_all_zero};

/// Check if `conv` is depthwise: groups equal input channels and kernel
/// output channels
pub fn is_depthwise(ctx: &GraphContext<'_>, conv: NodeId) -> PartitionResult<bool> {
    let Some(call) = ctx.call(conv) else {
        return Ok(false);
    };
    let (Some(&data), Some(&weight)) = (call.args.first(), call.args.get(1)) else {
        return Ok(false);
    };
    let groups = get_attr_i(&call.attrs, "groups").unwrap_or(1);
    let data_layout = get_attr_s(&call.attrs, "data_layout").unwrap_or("NCHW");
    let kernel_layout = get_attr_s(&call.attrs, "kernel_layout").unwrap_or("OIHW");

    let in_channels = dim_of(&ctx.tensor_type(data, "conv2d input")?.shape, data_layout, 'C')?;
    let out_channels = dim_of(
        &ctx.tensor_type(weight, "conv2d weight")?.shape,
        kernel_layout,
        'O',
    )?;

    Ok(usize::try_from(groups).is_ok_and(|g| g == in_channels && g == out_channels))
}

/// Legality predicate of the `qnn_conv2d` composite
#[tracing::instrument(level = "trace", skip(ctx))]
pub fn check_qnn_conv2d(ctx: &GraphContext<'_>, root: NodeId) -> PartitionResult<bool> {
    let Some(chain) = QnnChain::unwrap(ctx, root, &Op::QnnConv2d) else {
        debug!(%root, "not a requantized qnn.conv2d chain");
        return Ok(false);
    };

    let tuple = chain.dtype_tuple(ctx)?;
    if !check_dtype_tuple(&tuple) {
        debug!(%root, %tuple, "unsupported dtype combination");
        return Ok(false);
    }
    if !input_zero_point_ok(ctx, chain.core, tuple.input) {
        debug!(%root, "nonzero input zero point for int16 input");
        return Ok(false);
    }
    if !kernel_zero_points_all_zero(ctx, chain.core) {
        debug!(%root, "nonzero kernel zero point");
        return Ok(false);
    }
    if chain.bias_add.is_none() && is_depthwise(ctx, chain.core)? {
        debug!(%root, "depthwise conv2d without bias");
        return Ok(false);
    }
    Ok(true)
}

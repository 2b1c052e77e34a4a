//! Zero-point constraints
//!
//! Zero points are read out of the constants bound to the core operator's
//! arguments. A value that cannot be read as an integer makes the candidate
//! ineligible instead of failing the pass.

use tracing::debug;

use crate::graph::GraphContext;
use crate::ir::NodeId;
use crate::tensor::DType;

/// Argument slot of the input zero point on `qnn.conv2d` / `qnn.dense`
pub const INPUT_ZP_ARG: usize = 2;
/// Argument slot of the kernel zero point on `qnn.conv2d` / `qnn.dense`
pub const KERNEL_ZP_ARG: usize = 3;

fn zero_point_values(ctx: &GraphContext<'_>, core: NodeId, slot: usize) -> Option<Vec<i64>> {
    let arg = ctx.arg(core, slot)?;
    let Some(data) = ctx.constant(arg) else {
        debug!(%core, slot, "zero point is not a constant");
        return None;
    };
    match data.to_vec_i64() {
        Ok(values) => Some(values),
        Err(err) => {
            debug!(%core, slot, %err, "unreadable zero point");
            None
        }
    }
}

/// An `int16` input requires a zero input zero point
///
/// Only the first element is inspected. Other input dtypes are unconstrained.
pub fn input_zero_point_ok(ctx: &GraphContext<'_>, core: NodeId, input: DType) -> bool {
    if input != DType::Int16 {
        return true;
    }
    zero_point_values(ctx, core, INPUT_ZP_ARG)
        .and_then(|v| v.first().copied())
        .is_some_and(|zp| zp == 0)
}

/// Every entry of the kernel zero point (scalar or per channel) is zero
pub fn kernel_zero_points_all_zero(ctx: &GraphContext<'_>, core: NodeId) -> bool {
    zero_point_values(ctx, core, KERNEL_ZP_ARG)
        .is_some_and(|v| !v.is_empty() && v.iter().all(|&zp| zp == 0))
}

/// The first kernel zero point entry is zero
pub fn kernel_zero_point_scalar_zero(ctx: &GraphContext<'_>, core: NodeId) -> bool {
    zero_point_values(ctx, core, KERNEL_ZP_ARG)
        .and_then(|v| v.first().copied())
        .is_some_and(|zp| zp == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Conv2dAttrs, GraphBuilder};
    use crate::ir::{Function, Type};
    use crate::tensor::{scalar_f32, scalar_i32, vec_i32, TensorData};

    fn make_conv(input: DType, izp: TensorData, kzp: TensorData) -> (Function, NodeId) {
        let mut b = GraphBuilder::new();
        let x = b.var("x", Type::tensor(input, vec![1, 4, 4, 2]));
        let w = b.var("w", Type::tensor(DType::Int8, vec![1, 1, 2, 3]));
        let izp = b.constant(izp);
        let kzp = b.constant(kzp);
        let s = b.constant(scalar_f32(1.0));
        let conv = b
            .qnn_conv2d(x, w, izp, kzp, s, s, &Conv2dAttrs::nhwc())
            .unwrap();
        (b.finish(conv).unwrap(), conv)
    }

    #[test]
    fn test_input_zero_point_only_gates_int16() {
        let (f, conv) = make_conv(DType::Int8, scalar_i32(5), scalar_i32(0));
        assert!(input_zero_point_ok(&GraphContext::new(&f), conv, DType::Int8));

        let (f, conv) = make_conv(DType::Int16, scalar_i32(5), scalar_i32(0));
        assert!(!input_zero_point_ok(&GraphContext::new(&f), conv, DType::Int16));

        let (f, conv) = make_conv(DType::Int16, scalar_i32(0), scalar_i32(0));
        assert!(input_zero_point_ok(&GraphContext::new(&f), conv, DType::Int16));
    }

    #[test]
    fn test_kernel_zero_points() {
        let (f, conv) = make_conv(DType::Int8, scalar_i32(0), vec_i32(&[0, 0, 0]));
        let ctx = GraphContext::new(&f);
        assert!(kernel_zero_points_all_zero(&ctx, conv));

        let (f, conv) = make_conv(DType::Int8, scalar_i32(0), vec_i32(&[0, 2, 0]));
        let ctx = GraphContext::new(&f);
        assert!(!kernel_zero_points_all_zero(&ctx, conv));
        // dense only looks at the first entry
        assert!(kernel_zero_point_scalar_zero(&ctx, conv));
    }

    #[test]
    fn test_float_zero_point_is_ineligible() {
        let (f, conv) = make_conv(DType::Int8, scalar_i32(0), scalar_f32(0.0));
        let ctx = GraphContext::new(&f);
        assert!(!kernel_zero_points_all_zero(&ctx, conv));
        assert!(!kernel_zero_point_scalar_zero(&ctx, conv));
    }
}

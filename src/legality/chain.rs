//! Unwrapping a matched quantized chain
//!
//! Both conv2d and dense patterns have the shape
//! `[clip] -> requantize -> [bias_add] -> core`; the predicates start from
//! its root and walk down.

use crate::error::{PartitionError, PartitionResult};
use crate::graph::GraphContext;
use crate::infer::out_dtype;
use crate::ir::{NodeId, Op};

use super::dtypes::{default_bias_dtype, DtypeTuple};

/// Nodes of a matched `[clip] -> requantize -> [bias_add] -> core` chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QnnChain {
    /// Result of the whole pattern
    pub root: NodeId,
    /// The requantize node
    pub requantize: NodeId,
    /// The bias_add node, when present
    pub bias_add: Option<NodeId>,
    /// The core operator (`qnn.conv2d` / `qnn.dense`)
    pub core: NodeId,
}

impl QnnChain {
    /// Walk down from `root`; `None` if the nodes do not form the chain
    pub fn unwrap(ctx: &GraphContext<'_>, root: NodeId, core_op: &Op) -> Option<QnnChain> {
        let requantize = match ctx.call(root) {
            Some(c) if c.is_op(&Op::Clip) => *c.args.first()?,
            Some(_) => root,
            None => return None,
        };
        let rq = ctx.call(requantize).filter(|c| c.is_op(&Op::Requantize))?;
        let rq_input = *rq.args.first()?;

        let (bias_add, core) = match ctx.call(rq_input) {
            Some(c) if c.is_op(&Op::BiasAdd) => (Some(rq_input), *c.args.first()?),
            _ => (None, rq_input),
        };
        ctx.call(core).filter(|c| c.is_op(core_op))?;

        Some(QnnChain {
            root,
            requantize,
            bias_add,
            core,
        })
    }

    /// Gather the dtype tuple of the chain
    ///
    /// Fails with `MissingTypeInfo` if any inspected node is untyped.
    pub fn dtype_tuple(&self, ctx: &GraphContext<'_>) -> PartitionResult<DtypeTuple> {
        let call = ctx.call(self.core).ok_or_else(|| {
            PartitionError::Internal(format!("core operator {} is not a call", self.core))
        })?;
        let (Some(&input_id), Some(&weight_id)) = (call.args.first(), call.args.get(1)) else {
            return Err(PartitionError::Internal(format!(
                "core operator {} takes no weight",
                self.core
            )));
        };
        let input = ctx.tensor_type(input_id, "core operator input")?.dtype;
        let weight = ctx.tensor_type(weight_id, "core operator weight")?.dtype;

        let bias = match self.bias_add.and_then(|b| ctx.arg(b, 1)) {
            Some(bias) => ctx.tensor_type(bias, "bias")?.dtype,
            None => default_bias_dtype(input),
        };

        let checked = ctx.tensor_type(self.core, "core operator output")?.dtype;
        let core_out = out_dtype(&call.attrs, checked)?;

        let output = ctx.tensor_type(self.root, "pattern output")?.dtype;

        Ok(DtypeTuple {
            input,
            weight,
            bias,
            core_out,
            output,
        })
    }
}

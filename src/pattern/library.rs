//! Built-in pattern tables
//!
//! Two tables are provided:
//!
//! - [`build_pattern_table`]: the quantized table with legality predicates
//!   (`qnn_conv2d`, `qnn_fully_connected`)
//! - [`build_uma_pattern_table`]: the structural table of the UMA backend,
//!   whose predicates accept every match

use crate::error::PartitionResult;
use crate::ir::Op;
use crate::legality::{check_qnn_conv2d, check_qnn_dense};

use super::ast::{constant, op, wildcard, Pattern};
use super::table::{PatternEntry, PatternTable};

fn constants(n: usize) -> Vec<Pattern> {
    vec![constant(); n]
}

/// `[clip] -> requantize -> [bias_add] -> core(input, const x5)`
fn requantized(core_op: Op, input: Pattern) -> Pattern {
    let mut args = vec![input];
    args.extend(constants(5));
    let core = op(core_op, args);
    let bias_add = op(Op::BiasAdd, vec![core.clone().into(), constant()]);

    let mut rq_args = vec![core.or(bias_add)];
    rq_args.extend(constants(4));
    op(Op::Requantize, rq_args).optional_layer(Op::Clip)
}

/// `qnn.conv2d` with optional bias and clip
///
/// With `with_pad` the data input must come from `nn.pad(*, const)`.
pub fn qnn_conv2d_pattern(with_pad: bool) -> Pattern {
    let input = if with_pad {
        op(Op::Pad, vec![wildcard(), constant()]).into()
    } else {
        wildcard()
    };
    requantized(Op::QnnConv2d, input)
}

/// `qnn.dense` with optional bias and clip
pub fn qnn_fully_connected_pattern() -> Pattern {
    requantized(Op::QnnDense, wildcard())
}

/// Quantized pattern table for `target`
///
/// # Example
///
/// ```ignore
/// let table = build_pattern_table("rvx")?;
/// assert_eq!(table.names(), vec!["rvx.qnn_conv2d", "rvx.qnn_fully_connected"]);
/// ```
pub fn build_pattern_table(target: &str) -> PartitionResult<PatternTable> {
    PatternTable::new()
        .with(PatternEntry::new(
            format!("{target}.qnn_conv2d"),
            qnn_conv2d_pattern(false),
            check_qnn_conv2d,
        ))?
        .with(PatternEntry::new(
            format!("{target}.qnn_fully_connected"),
            qnn_fully_connected_pattern(),
            check_qnn_dense,
        ))
}

/// `nn.conv2d(*, *)` with unit strides and a single group
pub fn build_conv2d_pattern() -> Pattern {
    op(Op::Conv2d, vec![wildcard(), wildcard()])
        .has_attr("strides", vec![1i64, 1])
        .has_attr("groups", 1i64)
        .into()
}

/// `nn.dense(*, *)`; not registered in any built-in table
pub fn build_dense_pattern() -> Pattern {
    op(Op::Dense, vec![wildcard(), wildcard()]).into()
}

/// `requantize(qnn.conv2d(*, ...), *, *, *, *)`
pub fn build_uma_qnn_conv2d_pattern() -> Pattern {
    let conv = op(Op::QnnConv2d, vec![wildcard(); 6]);
    let mut args = vec![conv.into()];
    args.extend(vec![wildcard(); 4]);
    op(Op::Requantize, args).into()
}

/// `requantize(*, *, *, *, *)`
pub fn build_requantize_pattern() -> Pattern {
    op(Op::Requantize, vec![wildcard(); 5]).into()
}

/// Structural pattern table of the UMA backend for `target`
pub fn build_uma_pattern_table(target: &str) -> PartitionResult<PatternTable> {
    PatternTable::new()
        .with(PatternEntry::accepting(
            format!("{target}.conv2d"),
            build_conv2d_pattern(),
        ))?
        .with(PatternEntry::accepting(
            format!("{target}.qnn_conv2d"),
            build_uma_qnn_conv2d_pattern(),
        ))?
        .with(PatternEntry::accepting(
            format!("{target}.requantize"),
            build_requantize_pattern(),
        ))
}

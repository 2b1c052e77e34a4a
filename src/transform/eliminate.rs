//! Dead node elimination
//!
//! Drops nodes the function result no longer depends on once matched
//! subgraphs have moved into partition functions. Parameters always survive
//! so the signature of the rewritten function is unchanged.

use rustc_hash::FxHashMap;

use crate::error::{PartitionError, PartitionResult};
use crate::graph::GraphContext;
use crate::ir::{Function, Node, NodeId, NodeKind};

/// Result of an elimination run
#[derive(Debug, Clone)]
pub struct EliminationResult {
    /// The compacted function
    pub function: Function,
    /// Number of nodes removed
    pub eliminated: usize,
}

/// Rewrite the inputs of `node` through `remap`
pub fn remap_inputs(node: &mut Node, remap: &FxHashMap<NodeId, NodeId>) -> PartitionResult<()> {
    let lookup = |id: NodeId| {
        remap
            .get(&id)
            .copied()
            .ok_or_else(|| PartitionError::Internal(format!("no replacement for input {id}")))
    };
    match &mut node.kind {
        NodeKind::Call(call) => {
            for arg in call.args.iter_mut() {
                *arg = lookup(*arg)?;
            }
        }
        NodeKind::TupleGetItem { tuple, .. } => *tuple = lookup(*tuple)?,
        NodeKind::Var { .. } | NodeKind::Constant(_) => {}
    }
    Ok(())
}

/// Remove every node that is neither a parameter nor needed by the result
pub fn eliminate_dead_nodes(func: &Function) -> PartitionResult<EliminationResult> {
    let ctx = GraphContext::new(func);
    let mut live = ctx.reachable_from_output();
    live.extend(func.params.iter().copied());

    let mut out = Function::new();
    let mut remap = FxHashMap::default();
    for (id, node) in func.iter() {
        if !live.contains(&id) {
            continue;
        }
        let mut node = node.clone();
        remap_inputs(&mut node, &remap)?;
        remap.insert(id, out.push(node)?);
    }

    out.params = func
        .params
        .iter()
        .map(|p| {
            remap
                .get(p)
                .copied()
                .ok_or_else(|| PartitionError::Internal(format!("parameter {p} was dropped")))
        })
        .collect::<PartitionResult<_>>()?;
    out.output = remap
        .get(&func.output)
        .copied()
        .ok_or_else(|| PartitionError::Internal("function result was dropped".to_string()))?;
    out.attrs = func.attrs.clone();

    Ok(EliminationResult {
        eliminated: func.len() - out.len(),
        function: out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::ir::Type;
    use crate::tensor::{scalar_i32, DType};

    #[test]
    fn test_eliminate_keeps_params_and_live_nodes() {
        let mut b = GraphBuilder::new();
        let x = b.var("x", Type::tensor(DType::Int8, vec![4]));
        let unused = b.var("unused", Type::tensor(DType::Int8, vec![4]));
        b.relu(x).unwrap();
        b.constant(scalar_i32(0));
        let live = b.relu(x).unwrap();
        let f = b.finish(live).unwrap();

        let result = eliminate_dead_nodes(&f).unwrap();
        assert_eq!(result.eliminated, 2);
        let g = result.function;
        assert_eq!(g.params, vec![x, unused]);
        assert_eq!(g.output, NodeId(2));
        assert_eq!(g.node(NodeId(2)).unwrap().inputs(), &[x]);
    }

    #[test]
    fn test_remap_inputs_requires_mapping() {
        let mut b = GraphBuilder::new();
        let x = b.var("x", Type::tensor(DType::Int8, vec![4]));
        let r = b.relu(x).unwrap();
        let f = b.finish(r).unwrap();

        let mut node = f.node(r).unwrap().clone();
        let err = remap_inputs(&mut node, &FxHashMap::default()).unwrap_err();
        assert!(matches!(err, PartitionError::Internal(_)));

        let remap: FxHashMap<_, _> = [(x, NodeId(7))].into_iter().collect();
        remap_inputs(&mut node, &remap).unwrap();
        assert_eq!(node.inputs(), &[NodeId(7)]);
    }
}

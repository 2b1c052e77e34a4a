//! Graph traversal utilities
//!
//! Depth-first walk over argument edges, used to detect partitions whose
//! inputs depend on their own nodes.

use rustc_hash::FxHashSet;

use crate::ir::NodeId;

use super::context::GraphContext;

/// DFS over argument edges (user → argument)
pub struct DfsIterator<'a, 'f> {
    ctx: &'a GraphContext<'f>,
    stack: Vec<NodeId>,
    visited: FxHashSet<NodeId>,
}

impl<'a, 'f> DfsIterator<'a, 'f> {
    /// Walk the producers of `start`, `start` first
    pub fn backward(ctx: &'a GraphContext<'f>, start: NodeId) -> Self {
        let mut stack = Vec::new();
        let mut visited = FxHashSet::default();

        if start.index() < ctx.node_count() {
            stack.push(start);
            visited.insert(start);
        }

        Self {
            ctx,
            stack,
            visited,
        }
    }
}

impl Iterator for DfsIterator<'_, '_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        if let Ok(node) = self.ctx.node(id) {
            for &next in node.inputs() {
                if self.visited.insert(next) {
                    self.stack.push(next);
                }
            }
        }
        Some(id)
    }
}

/// Check if `start` depends, directly or transitively, on any node of `set`
pub fn depends_on_any(ctx: &GraphContext<'_>, start: NodeId, set: &FxHashSet<NodeId>) -> bool {
    DfsIterator::backward(ctx, start)
        .skip(1)
        .any(|id| set.contains(&id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::ir::{Function, Type};
    use crate::tensor::DType;

    fn make_chain_function() -> Function {
        let mut b = GraphBuilder::new();
        let x = b.var("x", Type::tensor(DType::Int8, vec![1, 4]));
        let a = b.relu(x).unwrap();
        let c = b.relu(a).unwrap();
        let d = b.relu(c).unwrap();
        b.finish(d).unwrap()
    }

    #[test]
    fn test_dfs_backward_visits_producers() {
        let func = make_chain_function();
        let ctx = GraphContext::new(&func);

        let nodes: Vec<_> = DfsIterator::backward(&ctx, NodeId(3)).collect();
        assert_eq!(nodes, vec![NodeId(3), NodeId(2), NodeId(1), NodeId(0)]);
        assert_eq!(DfsIterator::backward(&ctx, NodeId(9)).count(), 0);
    }

    #[test]
    fn test_depends_on_any() {
        let func = make_chain_function();
        let ctx = GraphContext::new(&func);

        let set: FxHashSet<NodeId> = [NodeId(1)].into_iter().collect();
        assert!(depends_on_any(&ctx, NodeId(3), &set));
        assert!(!depends_on_any(&ctx, NodeId(1), &set));
        assert!(!depends_on_any(&ctx, NodeId(0), &set));
    }
}

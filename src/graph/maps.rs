//! Graph map types and builders
//!
//! Defines the core data structures for efficient graph traversal.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::ir::{Function, NodeId};

/// Type alias for consumer map: node → [consumer nodes]
/// SmallVec optimized for common case of 1-4 consumers
pub type ConsumerMap = FxHashMap<NodeId, SmallVec<[NodeId; 4]>>;

/// Type alias for use count map: node → number of argument slots reading it
pub type UseCountMap = FxHashMap<NodeId, usize>;

/// Build consumer map from function nodes
///
/// Maps each node to the distinct nodes that read it, in topological order.
pub fn build_consumer_map(func: &Function) -> ConsumerMap {
    let mut map: ConsumerMap = FxHashMap::default();

    for (id, node) in func.iter() {
        for &input in node.inputs() {
            let consumers = map.entry(input).or_default();
            if consumers.last() != Some(&id) {
                consumers.push(id);
            }
        }
    }

    map
}

/// Build use count map (reference counting for values)
pub fn build_use_count_map(func: &Function) -> UseCountMap {
    let mut map: UseCountMap = FxHashMap::default();

    for (_, node) in func.iter() {
        for &input in node.inputs() {
            *map.entry(input).or_insert(0) += 1;
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::ir::{Attrs, Op, Type};
    use crate::tensor::DType;

    fn make_test_function() -> Function {
        let mut b = GraphBuilder::new();
        let x = b.var("x", Type::tensor(DType::Int8, vec![1, 4]));
        let r = b.relu(x).unwrap();
        let add = b
            .call(Op::Custom("add".into()), &[r, r], Attrs::new())
            .unwrap();
        b.finish(add).unwrap()
    }

    #[test]
    fn test_build_consumer_map() {
        let func = make_test_function();
        let map = build_consumer_map(&func);

        assert_eq!(
            map.get(&NodeId(0)).map(|v| v.as_slice()),
            Some(&[NodeId(1)][..])
        );
        // add reads relu twice but is listed once
        assert_eq!(
            map.get(&NodeId(1)).map(|v| v.as_slice()),
            Some(&[NodeId(2)][..])
        );
        assert!(map.get(&NodeId(2)).is_none());
    }

    #[test]
    fn test_build_use_count_map() {
        let func = make_test_function();
        let map = build_use_count_map(&func);

        assert_eq!(map.get(&NodeId(0)), Some(&1));
        assert_eq!(map.get(&NodeId(1)), Some(&2));
    }
}

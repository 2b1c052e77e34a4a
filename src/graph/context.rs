//! Graph context for function analysis
//!
//! `GraphContext` is the central read-only view the matcher, the legality
//! predicates and the partitioner share. It borrows a function and keeps
//! consumer maps for O(1) lookups.

use rustc_hash::FxHashSet;

use crate::error::{PartitionError, PartitionResult};
use crate::ir::{Call, Function, Node, NodeId, TensorType};
use crate::tensor::TensorData;

use super::maps::{build_consumer_map, build_use_count_map, ConsumerMap, UseCountMap};

/// Graph context for efficient graph queries
#[derive(Debug)]
pub struct GraphContext<'a> {
    func: &'a Function,

    /// Maps node → consumer nodes
    pub consumer_map: ConsumerMap,

    /// Maps node → reference count
    pub use_count_map: UseCountMap,
}

impl<'a> GraphContext<'a> {
    /// Create a new GraphContext over a function
    pub fn new(func: &'a Function) -> Self {
        Self {
            func,
            consumer_map: build_consumer_map(func),
            use_count_map: build_use_count_map(func),
        }
    }

    /// The borrowed function
    pub fn function(&self) -> &'a Function {
        self.func
    }

    // ========================================================================
    // Node accessors
    // ========================================================================

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> PartitionResult<&'a Node> {
        self.func.node(id)
    }

    /// Get the call payload of a node
    pub fn call(&self, id: NodeId) -> Option<&'a Call> {
        self.func.nodes.get(id.index()).and_then(Node::as_call)
    }

    /// Get the constant payload of a node
    pub fn constant(&self, id: NodeId) -> Option<&'a TensorData> {
        self.func.nodes.get(id.index()).and_then(Node::as_constant)
    }

    /// Argument `index` of call node `id`
    pub fn arg(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.call(id).and_then(|c| c.args.get(index).copied())
    }

    /// Checked tensor type of a node
    ///
    /// Fails with `MissingTypeInfo` when inference has not run; legality
    /// checks must never guess a type.
    pub fn tensor_type(&self, id: NodeId, context: &str) -> PartitionResult<&'a TensorType> {
        self.node(id)?
            .tensor_type()
            .ok_or_else(|| PartitionError::MissingTypeInfo {
                node: id.index(),
                context: context.to_string(),
            })
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.func.len()
    }

    // ========================================================================
    // Graph traversal
    // ========================================================================

    /// Consumer nodes of a value
    pub fn consumers(&self, id: NodeId) -> &[NodeId] {
        self.consumer_map
            .get(&id)
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }

    /// Check if a node is the function result
    pub fn is_output(&self, id: NodeId) -> bool {
        self.func.output == id
    }

    /// Check if a value is read by exactly one argument slot and is not the result
    pub fn is_single_use(&self, id: NodeId) -> bool {
        !self.is_output(id) && self.use_count_map.get(&id).copied().unwrap_or(0) == 1
    }

    /// Nodes the result depends on
    pub fn reachable_from_output(&self) -> FxHashSet<NodeId> {
        let mut seen = FxHashSet::default();
        let mut stack = vec![self.func.output];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Ok(node) = self.node(id) {
                stack.extend(node.inputs().iter().copied());
            }
        }
        seen
    }

    /// Check that every node the result depends on carries a checked type
    pub fn require_types(&self) -> PartitionResult<()> {
        let reachable = self.reachable_from_output();
        for (id, node) in self.func.iter() {
            if reachable.contains(&id) && node.checked_type.is_none() {
                return Err(PartitionError::MissingTypeInfo {
                    node: id.index(),
                    context: "partitioning requires inferred types".to_string(),
                });
            }
        }
        Ok(())
    }
}

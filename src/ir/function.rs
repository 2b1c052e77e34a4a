//! Functions: ordered node arenas
//!
//! A [`Function`] stores its nodes in a `Vec` whose order is a topological
//! order: every argument id is strictly smaller than the id of the node that
//! uses it. All passes rely on this, so [`Function::push`] rejects nodes that
//! would break it.

use crate::error::{PartitionError, PartitionResult};

use super::node::{Node, NodeId, NodeKind};
use super::types::Type;

/// Function-level attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionAttrs {
    /// Target that owns this function (set on extracted partitions)
    pub compiler: Option<String>,
    /// Composite pattern name the body was matched from
    pub composite: Option<String>,
    /// Externally visible symbol
    pub global_symbol: Option<String>,
    /// Function is a primitive unit for its compiler
    pub primitive: bool,
}

/// A function body
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Parameter nodes, in signature order (all `Var`)
    pub params: Vec<NodeId>,
    /// Node arena, topologically ordered
    pub nodes: Vec<Node>,
    /// Result node
    pub output: NodeId,
    /// Attributes
    pub attrs: FunctionAttrs,
}

impl Function {
    /// Create an empty function; `output` must be set before use
    pub fn new() -> Self {
        Self {
            params: Vec::new(),
            nodes: Vec::new(),
            output: NodeId(0),
            attrs: FunctionAttrs::default(),
        }
    }

    /// Append a node, checking the topological invariant
    pub fn push(&mut self, node: Node) -> PartitionResult<NodeId> {
        let id = NodeId::from(self.nodes.len());
        if let Some(bad) = node.inputs().iter().find(|input| **input >= id) {
            return Err(PartitionError::InvalidGraph(format!(
                "node {id} references {bad}, which is not defined before it"
            )));
        }
        if let NodeKind::Var { .. } = node.kind {
            self.params.push(id);
        }
        self.nodes.push(node);
        Ok(id)
    }

    /// Append a node that has no inputs (`Var` or `Constant`)
    pub fn push_leaf(&mut self, node: Node) -> NodeId {
        debug_assert!(node.inputs().is_empty(), "leaf nodes take no inputs");
        let id = NodeId::from(self.nodes.len());
        if let NodeKind::Var { .. } = node.kind {
            self.params.push(id);
        }
        self.nodes.push(node);
        id
    }

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> PartitionResult<&Node> {
        self.nodes
            .get(id.index())
            .ok_or_else(|| PartitionError::InvalidGraph(format!("node {id} out of range")))
    }

    /// Get a mutable node by id
    pub fn node_mut(&mut self, id: NodeId) -> PartitionResult<&mut Node> {
        self.nodes
            .get_mut(id.index())
            .ok_or_else(|| PartitionError::InvalidGraph(format!("node {id} out of range")))
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over `(id, node)` in topological order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId::from(i), n))
    }

    /// Check if this function was extracted for a compiler
    pub fn is_partition(&self) -> bool {
        self.attrs.compiler.is_some()
    }

    /// Declared parameter types, in signature order
    pub fn param_types(&self) -> PartitionResult<Vec<Type>> {
        self.params
            .iter()
            .map(|&id| match &self.node(id)?.kind {
                NodeKind::Var { ty, .. } => Ok(ty.clone()),
                _ => Err(PartitionError::InvalidGraph(format!(
                    "parameter {id} is not a variable"
                ))),
            })
            .collect()
    }

    /// Checked type of the result
    pub fn ret_type(&self) -> Option<&Type> {
        self.nodes
            .get(self.output.index())
            .and_then(|n| n.checked_type.as_ref())
    }

    /// Structural validation: output in range, params are vars
    pub fn validate(&self) -> PartitionResult<()> {
        if self.output.index() >= self.nodes.len() {
            return Err(PartitionError::InvalidGraph(format!(
                "output {} out of range ({} nodes)",
                self.output,
                self.nodes.len()
            )));
        }
        for (id, node) in self.iter() {
            if node.inputs().iter().any(|input| *input >= id) {
                return Err(PartitionError::InvalidGraph(format!(
                    "node {id} is not in topological order"
                )));
            }
        }
        self.param_types().map(|_| ())
    }
}

impl Default for Function {
    fn default() -> Self {
        Self::new()
    }
}

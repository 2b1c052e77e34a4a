//! Graph nodes

use std::fmt;

use smallvec::SmallVec;

use crate::tensor::TensorData;

use super::attrs::Attrs;
use super::op::Op;
use super::types::{TensorType, Type};

/// Index of a node inside its function's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Arena index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for NodeId {
    fn from(index: usize) -> Self {
        NodeId(index as u32)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Argument list; most operators take at most six inputs
pub type Args = SmallVec<[NodeId; 6]>;

/// What a call invokes
#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    /// A primitive operator
    Op(Op),
    /// A function of the enclosing module, by name
    Global(String),
}

impl Callee {
    /// The operator, if this is a primitive call
    pub fn as_op(&self) -> Option<&Op> {
        match self {
            Callee::Op(op) => Some(op),
            Callee::Global(_) => None,
        }
    }
}

/// An operator or function application
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// Invoked operator or function
    pub callee: Callee,
    /// Ordered arguments
    pub args: Args,
    /// Attribute mapping
    pub attrs: Attrs,
    /// Declared output type for operators without an inference rule
    pub annotation: Option<Type>,
}

impl Call {
    /// Check if this calls the given primitive operator
    pub fn is_op(&self, op: &Op) -> bool {
        self.callee.as_op() == Some(op)
    }
}

/// Node payload
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Function parameter
    Var {
        /// Parameter name
        name: String,
        /// Declared type
        ty: Type,
    },
    /// Embedded tensor value
    Constant(TensorData),
    /// Operator or function application
    Call(Call),
    /// Projection out of a tuple-typed value
    TupleGetItem {
        /// Tuple-producing node
        tuple: NodeId,
        /// Field index
        index: usize,
    },
}

/// A node and its checked type
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Payload
    pub kind: NodeKind,
    /// Type assigned by inference
    pub checked_type: Option<Type>,
}

impl Node {
    /// Create an untyped node
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            checked_type: None,
        }
    }

    /// The call payload, if any
    pub fn as_call(&self) -> Option<&Call> {
        match &self.kind {
            NodeKind::Call(call) => Some(call),
            _ => None,
        }
    }

    /// The constant payload, if any
    pub fn as_constant(&self) -> Option<&TensorData> {
        match &self.kind {
            NodeKind::Constant(data) => Some(data),
            _ => None,
        }
    }

    /// Check if this is a constant
    pub fn is_constant(&self) -> bool {
        matches!(self.kind, NodeKind::Constant(_))
    }

    /// Check if this calls the given primitive operator
    pub fn is_op(&self, op: &Op) -> bool {
        self.as_call().is_some_and(|c| c.is_op(op))
    }

    /// Input nodes in argument order
    pub fn inputs(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Call(call) => &call.args,
            NodeKind::TupleGetItem { tuple, .. } => std::slice::from_ref(tuple),
            NodeKind::Var { .. } | NodeKind::Constant(_) => &[],
        }
    }

    /// Checked tensor type, if inferred and tensor-valued
    pub fn tensor_type(&self) -> Option<&TensorType> {
        self.checked_type.as_ref().and_then(Type::as_tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::scalar_i32;

    fn call(op: Op, args: &[u32]) -> Node {
        Node::new(NodeKind::Call(Call {
            callee: Callee::Op(op),
            args: args.iter().map(|&i| NodeId(i)).collect(),
            attrs: Attrs::new(),
            annotation: None,
        }))
    }

    #[test]
    fn test_inputs() {
        let n = call(Op::BiasAdd, &[0, 1]);
        assert_eq!(n.inputs(), &[NodeId(0), NodeId(1)]);

        let c = Node::new(NodeKind::Constant(scalar_i32(0)));
        assert!(c.inputs().is_empty());
        assert!(c.is_constant());

        let t = Node::new(NodeKind::TupleGetItem {
            tuple: NodeId(4),
            index: 1,
        });
        assert_eq!(t.inputs(), &[NodeId(4)]);
    }

    #[test]
    fn test_is_op() {
        let n = call(Op::Clip, &[0]);
        assert!(n.is_op(&Op::Clip));
        assert!(!n.is_op(&Op::Requantize));
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId(12).to_string(), "%12");
        assert_eq!(NodeId::from(3usize).index(), 3);
    }
}

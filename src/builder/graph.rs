//! Fluent function builder

use crate::error::{PartitionError, PartitionResult};
use crate::ir::{Attrs, Call, Callee, Function, IrModule, Node, NodeId, NodeKind, Op, Type};
use crate::tensor::TensorData;

/// Builder for a [`Function`]
///
/// Nodes are appended in call order, which keeps the arena topologically
/// sorted by construction.
///
/// # Example
///
/// ```ignore
/// let mut b = GraphBuilder::new();
/// let x = b.var("x", Type::tensor(DType::Int8, vec![1, 16]));
/// let y = b.call(Op::Relu, &[x], Attrs::new())?;
/// let main = b.finish(y)?;
/// ```
#[derive(Debug, Default)]
pub struct GraphBuilder {
    func: Function,
}

impl GraphBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter
    pub fn var(&mut self, name: &str, ty: Type) -> NodeId {
        self.func.push_leaf(Node::new(NodeKind::Var {
            name: name.to_string(),
            ty,
        }))
    }

    /// Add a constant
    pub fn constant(&mut self, data: TensorData) -> NodeId {
        self.func.push_leaf(Node::new(NodeKind::Constant(data)))
    }

    /// Add a primitive operator call
    pub fn call(&mut self, op: Op, args: &[NodeId], attrs: Attrs) -> PartitionResult<NodeId> {
        self.push_call(Callee::Op(op), args, attrs, None)
    }

    /// Add a call whose output type is declared rather than inferred
    pub fn call_annotated(
        &mut self,
        op: Op,
        args: &[NodeId],
        attrs: Attrs,
        ty: Type,
    ) -> PartitionResult<NodeId> {
        self.push_call(Callee::Op(op), args, attrs, Some(ty))
    }

    /// Add a call to another function of the module
    pub fn call_global(&mut self, name: &str, args: &[NodeId]) -> PartitionResult<NodeId> {
        self.push_call(Callee::Global(name.to_string()), args, Attrs::new(), None)
    }

    /// Add a tuple projection
    pub fn tuple_get_item(&mut self, tuple: NodeId, index: usize) -> PartitionResult<NodeId> {
        self.func
            .push(Node::new(NodeKind::TupleGetItem { tuple, index }))
    }

    /// Number of nodes added so far
    pub fn len(&self) -> usize {
        self.func.len()
    }

    /// Check if nothing was added yet
    pub fn is_empty(&self) -> bool {
        self.func.is_empty()
    }

    /// Finish the function with `output` as its result
    pub fn finish(mut self, output: NodeId) -> PartitionResult<Function> {
        if output.index() >= self.func.len() {
            return Err(PartitionError::InvalidGraph(format!(
                "output {output} was never added"
            )));
        }
        self.func.output = output;
        Ok(self.func)
    }

    /// Finish as the `main` function of a new module
    pub fn finish_module(self, output: NodeId) -> PartitionResult<IrModule> {
        Ok(IrModule::from_main(self.finish(output)?))
    }

    fn push_call(
        &mut self,
        callee: Callee,
        args: &[NodeId],
        attrs: Attrs,
        annotation: Option<Type>,
    ) -> PartitionResult<NodeId> {
        if let Callee::Op(op) = &callee {
            if let Some(arity) = op.arity() {
                if arity != args.len() {
                    return Err(PartitionError::InvalidGraph(format!(
                        "{op} takes {arity} arguments, got {}",
                        args.len()
                    )));
                }
            }
        }
        self.func.push(Node::new(NodeKind::Call(Call {
            callee,
            args: args.iter().copied().collect(),
            attrs,
            annotation,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::{scalar_i32, DType};

    #[test]
    fn test_builder_order() {
        let mut b = GraphBuilder::new();
        let x = b.var("x", Type::tensor(DType::Int8, vec![1, 4]));
        let c = b.constant(scalar_i32(0));
        let y = b.call(Op::Relu, &[x], Attrs::new()).unwrap();
        let f = b.finish(y).unwrap();

        assert_eq!(x, NodeId(0));
        assert_eq!(c, NodeId(1));
        assert_eq!(f.output, NodeId(2));
        assert_eq!(f.params, vec![x]);
    }

    #[test]
    fn test_arity_checked() {
        let mut b = GraphBuilder::new();
        let x = b.var("x", Type::tensor(DType::Int8, vec![1, 4]));
        assert!(b.call(Op::BiasAdd, &[x], Attrs::new()).is_err());
        // custom ops take anything
        assert!(b
            .call(Op::Custom("concat".into()), &[x, x, x], Attrs::new())
            .is_ok());
    }

    #[test]
    fn test_finish_rejects_unknown_output() {
        let b = GraphBuilder::new();
        assert!(b.finish(NodeId(0)).is_err());
    }
}

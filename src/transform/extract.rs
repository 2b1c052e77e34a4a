//! Partition extraction
//!
//! Moves each component into its own function and rewires the host to call
//! it. The extracted body is a structural copy: constants are duplicated
//! into the body, wildcard-bound values become parameters, and every copied
//! node keeps its checked type so verification can compare before and
//! after.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::error::{PartitionError, PartitionResult};
use crate::graph::GraphContext;
use crate::ir::{Attrs, Call, Callee, Function, FunctionAttrs, Node, NodeId, NodeKind, Type};

use super::components::Component;
use super::eliminate::{eliminate_dead_nodes, remap_inputs};

/// A component with its assigned function name
#[derive(Debug, Clone)]
pub struct Partition {
    /// Name of the extracted function
    pub name: String,
    /// Composite pattern the body was matched from
    pub composite: String,
    /// The extracted subgraph
    pub component: Component,
}

/// Types a partition must expose at its boundary
#[derive(Debug, Clone, PartialEq)]
pub struct BoundarySignature {
    /// Partition function name
    pub partition: String,
    /// Types of the external inputs, in parameter order
    pub params: Vec<Type>,
    /// Type of the root
    pub ret: Type,
}

fn checked_type(ctx: &GraphContext<'_>, id: NodeId) -> PartitionResult<Type> {
    ctx.node(id)?
        .checked_type
        .clone()
        .ok_or_else(|| PartitionError::MissingTypeInfo {
            node: id.index(),
            context: "partition boundary".to_string(),
        })
}

fn lookup(remap: &FxHashMap<NodeId, NodeId>, id: NodeId) -> PartitionResult<NodeId> {
    remap
        .get(&id)
        .copied()
        .ok_or_else(|| PartitionError::Internal(format!("{id} was not copied")))
}

/// Boundary types of `partition` as seen in the host before extraction
pub fn boundary_signature(
    ctx: &GraphContext<'_>,
    partition: &Partition,
) -> PartitionResult<BoundarySignature> {
    let component = &partition.component;
    Ok(BoundarySignature {
        partition: partition.name.clone(),
        params: component
            .inputs
            .iter()
            .map(|&id| checked_type(ctx, id))
            .collect::<PartitionResult<_>>()?,
        ret: checked_type(ctx, component.root)?,
    })
}

/// Build the function holding `partition`'s body
pub fn build_partition_function(
    ctx: &GraphContext<'_>,
    partition: &Partition,
    target: &str,
) -> PartitionResult<Function> {
    let component = &partition.component;
    let mut func = Function::new();
    let mut remap = FxHashMap::default();

    for (i, &input) in component.inputs.iter().enumerate() {
        let ty = checked_type(ctx, input)?;
        let param = func.push_leaf(Node {
            kind: NodeKind::Var {
                name: format!("{}_arg{i}", partition.name),
                ty: ty.clone(),
            },
            checked_type: Some(ty),
        });
        remap.insert(input, param);
    }
    for &constant in &component.constants {
        let copy = func.push_leaf(ctx.node(constant)?.clone());
        remap.insert(constant, copy);
    }
    for &id in &component.nodes {
        let mut node = ctx.node(id)?.clone();
        remap_inputs(&mut node, &remap)?;
        remap.insert(id, func.push(node)?);
    }

    func.output = lookup(&remap, component.root)?;
    func.attrs = FunctionAttrs {
        compiler: Some(target.to_string()),
        composite: Some(partition.composite.clone()),
        global_symbol: Some(partition.name.clone()),
        primitive: true,
    };
    debug!(
        partition = partition.name.as_str(),
        composite = partition.composite.as_str(),
        params = component.inputs.len(),
        nodes = func.len(),
        "extracted partition"
    );
    Ok(func)
}

/// Rewrite the scanned function so each root calls its partition
///
/// Interior calls disappear, each root becomes a global call with the
/// root's type, and nodes left without readers are dropped.
pub fn rewrite_host(ctx: &GraphContext<'_>, partitions: &[Partition]) -> PartitionResult<Function> {
    let func = ctx.function();
    let roots: FxHashMap<NodeId, &Partition> = partitions
        .iter()
        .map(|p| (p.component.root, p))
        .collect();
    let interior: FxHashSet<NodeId> = partitions
        .iter()
        .flat_map(|p| p.component.nodes.iter().copied())
        .filter(|id| !roots.contains_key(id))
        .collect();

    let mut host = Function::new();
    let mut remap = FxHashMap::default();
    for (id, node) in func.iter() {
        if interior.contains(&id) {
            continue;
        }
        let node = match roots.get(&id) {
            Some(p) => Node {
                kind: NodeKind::Call(Call {
                    callee: Callee::Global(p.name.clone()),
                    args: p
                        .component
                        .inputs
                        .iter()
                        .map(|&input| lookup(&remap, input))
                        .collect::<PartitionResult<_>>()?,
                    attrs: Attrs::new(),
                    annotation: None,
                }),
                checked_type: node.checked_type.clone(),
            },
            None => {
                let mut node = node.clone();
                remap_inputs(&mut node, &remap)?;
                node
            }
        };
        remap.insert(id, host.push(node)?);
    }

    host.params = func
        .params
        .iter()
        .map(|&p| lookup(&remap, p))
        .collect::<PartitionResult<_>>()?;
    host.output = lookup(&remap, func.output)?;
    host.attrs = func.attrs.clone();

    let result = eliminate_dead_nodes(&host)?;
    debug!(
        partitions = partitions.len(),
        eliminated = result.eliminated,
        nodes = result.function.len(),
        "rewrote host function"
    );
    Ok(result.function)
}

//! Region annotation
//!
//! Tags every call of an accepted match with `(target, region)` and records
//! the edges that cross a tag boundary. Untagged nodes run on the host.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::graph::GraphContext;
use crate::ir::NodeId;

use super::merge::AcceptedMatch;

/// Placement of a tagged node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionTag {
    /// Index into the accepted matches
    pub region: usize,
}

/// An edge whose endpoints carry different tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Boundary {
    /// Producing node
    pub producer: NodeId,
    /// Consuming node, `None` for the function result
    pub consumer: Option<NodeId>,
}

/// Tags and boundaries of one function
#[derive(Debug, Clone, Default)]
pub struct Annotation {
    /// Target every region belongs to
    pub target: String,
    /// Tag per offloaded call
    pub tags: FxHashMap<NodeId, RegionTag>,
    /// Crossing edges in node order
    pub boundaries: Vec<Boundary>,
}

impl Annotation {
    /// Tag of `id`, `None` for host nodes
    pub fn tag(&self, id: NodeId) -> Option<RegionTag> {
        self.tags.get(&id).copied()
    }

    /// Number of tagged nodes
    pub fn tagged_count(&self) -> usize {
        self.tags.len()
    }

    /// Boundaries entering `region`
    pub fn inputs_of(&self, region: usize) -> impl Iterator<Item = &Boundary> + '_ {
        self.boundaries.iter().filter(move |b| {
            b.consumer
                .and_then(|c| self.tag(c))
                .is_some_and(|t| t.region == region)
        })
    }

    /// Boundaries leaving `region`
    pub fn outputs_of(&self, region: usize) -> impl Iterator<Item = &Boundary> + '_ {
        self.boundaries
            .iter()
            .filter(move |b| self.tag(b.producer).is_some_and(|t| t.region == region))
    }
}

/// Tag the calls of `accepted` and collect boundary edges
pub fn annotate(ctx: &GraphContext<'_>, accepted: &[AcceptedMatch], target: &str) -> Annotation {
    let mut annotation = Annotation {
        target: target.to_string(),
        ..Default::default()
    };
    for (region, m) in accepted.iter().enumerate() {
        for &id in &m.matched.calls {
            annotation.tags.insert(id, RegionTag { region });
        }
    }

    let mut seen = FxHashSet::default();
    for (id, node) in ctx.function().iter() {
        let tag = annotation.tag(id);
        for &arg in node.inputs() {
            let arg_tag = annotation.tag(arg);
            if arg_tag == tag {
                continue;
            }
            let edge = Boundary {
                producer: arg,
                consumer: Some(id),
            };
            if seen.insert(edge) {
                annotation.boundaries.push(edge);
            }
        }
    }
    let output = ctx.function().output;
    if annotation.tag(output).is_some() {
        annotation.boundaries.push(Boundary {
            producer: output,
            consumer: None,
        });
    }

    debug!(
        compiler = target,
        tagged = annotation.tagged_count(),
        boundaries = annotation.boundaries.len(),
        "annotated"
    );
    annotation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::infer::infer_function_standalone;
    use crate::ir::{Attrs, Function, Op, Type};
    use crate::pattern::MatchResult;
    use crate::tensor::DType;

    /// x -> relu -> relu -> relu
    fn make_relu_chain() -> Function {
        let mut b = GraphBuilder::new();
        let x = b.var("x", Type::tensor(DType::Int8, vec![4]));
        let r1 = b.relu(x).unwrap();
        let r2 = b.relu(r1).unwrap();
        let r3 = b.relu(r2).unwrap();
        infer_function_standalone(&b.finish(r3).unwrap()).unwrap()
    }

    fn region(root: u32, calls: &[u32], input: u32) -> AcceptedMatch {
        AcceptedMatch {
            entry: 0,
            composite: "t.relu2".to_string(),
            matched: MatchResult {
                root: NodeId(root),
                calls: calls.iter().map(|&i| NodeId(i)).collect(),
                constants: Vec::new(),
                inputs: vec![NodeId(input)],
            },
        }
    }

    #[test]
    fn test_interior_region_boundaries() {
        let f = make_relu_chain();
        let ctx = GraphContext::new(&f);
        let annotation = annotate(&ctx, &[region(2, &[2, 1], 0)], "t");

        assert_eq!(annotation.tagged_count(), 2);
        assert_eq!(annotation.tag(NodeId(3)), None);
        assert_eq!(
            annotation.boundaries,
            vec![
                Boundary { producer: NodeId(0), consumer: Some(NodeId(1)) },
                Boundary { producer: NodeId(2), consumer: Some(NodeId(3)) },
            ]
        );
        assert_eq!(annotation.inputs_of(0).count(), 1);
        assert_eq!(annotation.outputs_of(0).count(), 1);
    }

    #[test]
    fn test_output_boundary() {
        let f = make_relu_chain();
        let ctx = GraphContext::new(&f);
        let annotation = annotate(&ctx, &[region(3, &[3, 2], 1)], "t");

        assert_eq!(
            annotation.boundaries.last(),
            Some(&Boundary { producer: NodeId(3), consumer: None })
        );
        assert_eq!(annotation.boundaries.len(), 2);
    }

    #[test]
    fn test_repeated_argument_is_one_boundary() {
        let mut b = GraphBuilder::new();
        let x = b.var("x", Type::tensor(DType::Int8, vec![4]));
        let r = b.relu(x).unwrap();
        let pair = b
            .call(Op::Custom("add".into()), &[r, r], Attrs::new())
            .unwrap();
        let f = b.finish(pair).unwrap();
        let ctx = GraphContext::new(&f);
        let annotation = annotate(&ctx, &[region(1, &[1], 0)], "t");

        let edge = Boundary { producer: NodeId(1), consumer: Some(NodeId(2)) };
        assert_eq!(annotation.boundaries.iter().filter(|b| **b == edge).count(), 1);
        assert_eq!(annotation.boundaries.len(), 2);
    }

    #[test]
    fn test_adjacent_regions_share_one_edge() {
        let f = make_relu_chain();
        let ctx = GraphContext::new(&f);
        let annotation = annotate(&ctx, &[region(3, &[3], 2), region(2, &[2], 1)], "t");

        let between = Boundary { producer: NodeId(2), consumer: Some(NodeId(3)) };
        assert_eq!(annotation.boundaries.iter().filter(|b| **b == between).count(), 1);
        assert_eq!(annotation.outputs_of(1).count(), 1);
        assert_eq!(annotation.inputs_of(0).count(), 1);
    }
}

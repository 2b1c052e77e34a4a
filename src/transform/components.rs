//! Connected components of tagged nodes
//!
//! Union-find over producer/consumer edges whose endpoints share a tag. Each
//! component must coincide with the region of its accepted match and have
//! the match root as its only output; anything else means annotation and
//! matching disagree, which is an internal error.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{PartitionError, PartitionResult};
use crate::graph::{depends_on_any, GraphContext};
use crate::ir::NodeId;

use super::annotate::Annotation;
use super::merge::AcceptedMatch;

/// Disjoint-set forest with path halving and union by rank
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    /// `n` singleton sets
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    /// Representative of `x`
    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets of `a` and `b`
    pub fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// One extractable subgraph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Region (index of the accepted match)
    pub region: usize,
    /// Result node
    pub root: NodeId,
    /// Calls, ascending
    pub nodes: Vec<NodeId>,
    /// Constants copied into the body, ascending
    pub constants: Vec<NodeId>,
    /// External values, in parameter order
    pub inputs: Vec<NodeId>,
}

impl Component {
    /// Check if `id` is one of the component's calls
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.binary_search(&id).is_ok()
    }

    /// Fail if an external input depends on the component itself
    ///
    /// Extracting such a component would make the partition call consume
    /// its own result.
    pub fn check_acyclic(&self, ctx: &GraphContext<'_>, partition: &str) -> PartitionResult<()> {
        let members: FxHashSet<NodeId> = self.nodes.iter().copied().collect();
        match self
            .inputs
            .iter()
            .find(|&&input| depends_on_any(ctx, input, &members))
        {
            Some(input) => Err(PartitionError::PartitionCycle {
                partition: partition.to_string(),
                input: input.index(),
            }),
            None => Ok(()),
        }
    }
}

/// Compute one component per accepted match, in match order
pub fn connected_components(
    ctx: &GraphContext<'_>,
    annotation: &Annotation,
    accepted: &[AcceptedMatch],
) -> PartitionResult<Vec<Component>> {
    let mut tagged: Vec<NodeId> = annotation.tags.keys().copied().collect();
    tagged.sort_unstable();
    let position: FxHashMap<NodeId, usize> =
        tagged.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    let mut sets = UnionFind::new(tagged.len());
    for (i, &id) in tagged.iter().enumerate() {
        let tag = annotation.tag(id);
        for arg in ctx.node(id)?.inputs() {
            if annotation.tag(*arg) == tag {
                if let Some(&j) = position.get(arg) {
                    sets.union(i, j);
                }
            }
        }
    }

    let mut groups: FxHashMap<usize, Vec<NodeId>> = FxHashMap::default();
    for (i, &id) in tagged.iter().enumerate() {
        groups.entry(sets.find(i)).or_default().push(id);
    }

    let mut by_region: Vec<Option<Vec<NodeId>>> = vec![None; accepted.len()];
    for nodes in groups.into_values() {
        let region = nodes
            .first()
            .and_then(|id| annotation.tag(*id))
            .map(|t| t.region)
            .ok_or_else(|| PartitionError::Internal("untagged component".to_string()))?;
        let slot = by_region.get_mut(region).ok_or_else(|| {
            PartitionError::Internal(format!("region {region} has no accepted match"))
        })?;
        if slot.is_some() {
            return Err(PartitionError::Internal(format!(
                "region {region} splits into several components"
            )));
        }
        *slot = Some(nodes);
    }

    accepted
        .iter()
        .zip(by_region)
        .enumerate()
        .map(|(region, (m, nodes))| {
            let nodes = nodes.ok_or_else(|| {
                PartitionError::Internal(format!("region {region} has no tagged nodes"))
            })?;
            build_component(ctx, region, m, nodes)
        })
        .collect()
}

fn build_component(
    ctx: &GraphContext<'_>,
    region: usize,
    m: &AcceptedMatch,
    mut nodes: Vec<NodeId>,
) -> PartitionResult<Component> {
    nodes.sort_unstable();
    let matched = &m.matched;

    let mut expected = matched.calls.clone();
    expected.sort_unstable();
    if nodes != expected {
        return Err(PartitionError::Internal(format!(
            "component of region {region} does not coincide with its match at {}",
            matched.root
        )));
    }
    let members: FxHashSet<NodeId> = nodes.iter().copied().collect();

    let outputs: Vec<NodeId> = nodes
        .iter()
        .copied()
        .filter(|&id| {
            ctx.is_output(id) || ctx.consumers(id).iter().any(|c| !members.contains(c))
        })
        .collect();
    if outputs != [matched.root] {
        return Err(PartitionError::Internal(format!(
            "region {region} must have exactly one output {}, found {outputs:?}",
            matched.root
        )));
    }

    let mut constants = Vec::new();
    for &id in &nodes {
        for &arg in ctx.node(id)?.inputs() {
            if members.contains(&arg) || matched.inputs.contains(&arg) {
                continue;
            }
            if !matched.constants.contains(&arg) {
                return Err(PartitionError::Internal(format!(
                    "{arg} feeds region {region} but was bound by no pattern"
                )));
            }
            if !constants.contains(&arg) {
                constants.push(arg);
            }
        }
    }
    constants.sort_unstable();

    Ok(Component {
        region,
        root: matched.root,
        nodes,
        constants,
        inputs: matched.inputs.clone(),
    })
}

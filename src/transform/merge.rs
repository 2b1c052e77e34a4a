//! Composite merging
//!
//! Walks the anchors of one function and decides, per anchor, which table
//! entry (if any) claims it. Each anchor runs the state machine
//!
//! ```text
//! Unvisited -> AttemptingPattern(i) -> Accepted(i)
//!                                   -> RejectedByLegality(i) -> AttemptingPattern(i + 1)
//!                                   -> HostDefault
//! ```
//!
//! Anchors are visited in descending node order, so a consumer always gets
//! the first chance to absorb its producers. Entries are tried in table
//! order. Evaluation of one (anchor, entry) pair is atomic: a candidate is
//! either fully accepted or leaves no trace.

use std::fmt;

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::error::PartitionResult;
use crate::graph::GraphContext;
use crate::ir::{Callee, NodeId};
use crate::pattern::{MatchResult, PatternMatcher, PatternTable};

use super::core::PartitionStats;

/// State of one anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorState {
    /// Not examined yet
    Unvisited,
    /// Trying table entry `i`
    AttemptingPattern(usize),
    /// Entry `i` matched and passed its predicate
    Accepted(usize),
    /// Entry `i` matched but its predicate refused
    RejectedByLegality(usize),
    /// No entry claimed the anchor; it stays on the host
    HostDefault,
}

impl AnchorState {
    /// Check if the state is terminal
    pub fn is_terminal(self) -> bool {
        matches!(self, AnchorState::Accepted(_) | AnchorState::HostDefault)
    }
}

/// A candidate accepted by structure and legality
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedMatch {
    /// Index of the claiming table entry
    pub entry: usize,
    /// Composite name of the claiming entry
    pub composite: String,
    /// The structural match
    pub matched: MatchResult,
}

/// Why a structural match cannot become a partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralConflict {
    /// A matched call already belongs to an accepted match
    Overlap(NodeId),
    /// A non-root matched call is read outside the match
    EscapingValue(NodeId),
    /// A wildcard bound a node that is also a matched call
    AliasedInput(NodeId),
}

impl fmt::Display for StructuralConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralConflict::Overlap(id) => write!(f, "{id} already belongs to a partition"),
            StructuralConflict::EscapingValue(id) => write!(f, "{id} is used outside the match"),
            StructuralConflict::AliasedInput(id) => write!(f, "{id} is both input and interior"),
        }
    }
}

/// Find the first structural reason `m` cannot be extracted
pub fn structural_conflict(
    ctx: &GraphContext<'_>,
    m: &MatchResult,
    consumed: &FxHashSet<NodeId>,
) -> Option<StructuralConflict> {
    if let Some(&id) = m.calls.iter().find(|id| consumed.contains(id)) {
        return Some(StructuralConflict::Overlap(id));
    }
    for id in m.interior() {
        let escapes = ctx.is_output(id) || ctx.consumers(id).iter().any(|c| !m.contains_call(*c));
        if escapes {
            return Some(StructuralConflict::EscapingValue(id));
        }
    }
    m.inputs
        .iter()
        .find(|id| m.contains_call(**id))
        .map(|&id| StructuralConflict::AliasedInput(id))
}

/// Select the accepted matches of one function
///
/// Returned matches are disjoint and ordered by descending root.
#[tracing::instrument(level = "debug", skip_all, fields(nodes = ctx.node_count(), entries = table.len()))]
pub fn merge_composite(
    ctx: &GraphContext<'_>,
    table: &PatternTable,
    stats: &mut PartitionStats,
) -> PartitionResult<Vec<AcceptedMatch>> {
    let matcher = PatternMatcher::new(ctx);
    let mut consumed: FxHashSet<NodeId> = FxHashSet::default();
    let mut accepted = Vec::new();

    for (anchor, node) in ctx.function().iter().rev() {
        let Some(call) = node.as_call() else {
            continue;
        };
        if matches!(call.callee, Callee::Global(_)) || consumed.contains(&anchor) {
            continue;
        }
        stats.anchors_visited += 1;

        let mut state = AnchorState::Unvisited;
        for (i, entry) in table.iter().enumerate() {
            trace!(%anchor, from = ?state, to = ?AnchorState::AttemptingPattern(i), "anchor transition");
            state = AnchorState::AttemptingPattern(i);
            stats.patterns_attempted += 1;

            let Some(m) = matcher.match_at(&entry.pattern, anchor)? else {
                continue;
            };
            if let Some(conflict) = structural_conflict(ctx, &m, &consumed) {
                stats.structural_rejections += 1;
                debug!(%anchor, composite = entry.name.as_str(), %conflict, "structural rejection");
                continue;
            }
            if !entry.check(ctx, anchor)? {
                stats.legality_rejections += 1;
                trace!(%anchor, from = ?state, to = ?AnchorState::RejectedByLegality(i), "anchor transition");
                state = AnchorState::RejectedByLegality(i);
                debug!(%anchor, composite = entry.name.as_str(), "rejected by legality");
                continue;
            }

            trace!(%anchor, from = ?state, to = ?AnchorState::Accepted(i), "anchor transition");
            state = AnchorState::Accepted(i);
            debug!(%anchor, composite = entry.name.as_str(), calls = m.len(), "accepted");
            consumed.extend(m.calls.iter().copied());
            accepted.push(AcceptedMatch {
                entry: i,
                composite: entry.name.clone(),
                matched: m,
            });
            break;
        }

        if !state.is_terminal() {
            trace!(%anchor, from = ?state, to = ?AnchorState::HostDefault, "anchor transition");
        }
    }

    Ok(accepted)
}

//! Pattern matching engine
//!
//! Matches a [`Pattern`] tree against the dataflow graph, starting at an
//! anchor node and recursing into call arguments (output-to-input).

use crate::error::{PartitionError, PartitionResult};
use crate::graph::GraphContext;
use crate::ir::{NodeId, NodeKind};

use super::ast::{OpPattern, Pattern};

/// Result of a successful pattern match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// The anchor node (result of the matched subgraph)
    pub root: NodeId,
    /// Matched calls, root first, de-duplicated
    pub calls: Vec<NodeId>,
    /// Constants matched by constant patterns
    pub constants: Vec<NodeId>,
    /// Nodes bound by wildcards, in first-binding order
    pub inputs: Vec<NodeId>,
}

impl MatchResult {
    /// Number of matched calls
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Check if no call was matched
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Check if `id` is one of the matched calls
    pub fn contains_call(&self, id: NodeId) -> bool {
        self.calls.contains(&id)
    }

    /// Matched calls other than the root
    pub fn interior(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.calls.iter().copied().filter(move |&id| id != self.root)
    }
}

#[derive(Debug, Default)]
struct Bindings {
    calls: Vec<NodeId>,
    constants: Vec<NodeId>,
    inputs: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy)]
struct Mark(usize, usize, usize);

impl Bindings {
    fn mark(&self) -> Mark {
        Mark(self.calls.len(), self.constants.len(), self.inputs.len())
    }

    fn restore(&mut self, mark: Mark) {
        self.calls.truncate(mark.0);
        self.constants.truncate(mark.1);
        self.inputs.truncate(mark.2);
    }

    fn bind(list: &mut Vec<NodeId>, id: NodeId) {
        if !list.contains(&id) {
            list.push(id);
        }
    }
}

/// Pattern matcher over one function
pub struct PatternMatcher<'c, 'f> {
    ctx: &'c GraphContext<'f>,
}

impl<'c, 'f> PatternMatcher<'c, 'f> {
    /// Create a new pattern matcher
    pub fn new(ctx: &'c GraphContext<'f>) -> Self {
        Self { ctx }
    }

    /// Match `pattern` with `anchor` as its root
    ///
    /// Returns `Ok(None)` when the pattern does not match. An attribute
    /// constraint naming a key the matched call does not carry is a
    /// `MalformedPattern` error.
    pub fn match_at(
        &self,
        pattern: &Pattern,
        anchor: NodeId,
    ) -> PartitionResult<Option<MatchResult>> {
        let mut bindings = Bindings::default();
        if !self.visit(pattern, anchor, &mut bindings)? {
            return Ok(None);
        }
        Ok(Some(MatchResult {
            root: anchor,
            calls: bindings.calls,
            constants: bindings.constants,
            inputs: bindings.inputs,
        }))
    }

    /// Check if `pattern` matches at `anchor`
    pub fn matches(&self, pattern: &Pattern, anchor: NodeId) -> PartitionResult<bool> {
        Ok(self.match_at(pattern, anchor)?.is_some())
    }

    /// All anchors where `pattern` matches, in reverse topological order
    pub fn find_all_matches(&self, pattern: &Pattern) -> PartitionResult<Vec<MatchResult>> {
        let mut results = Vec::new();
        for (id, _) in self.ctx.function().iter().rev() {
            if let Some(m) = self.match_at(pattern, id)? {
                results.push(m);
            }
        }
        Ok(results)
    }

    fn visit(&self, pattern: &Pattern, id: NodeId, b: &mut Bindings) -> PartitionResult<bool> {
        match pattern {
            Pattern::Wildcard => {
                Bindings::bind(&mut b.inputs, id);
                Ok(true)
            }
            Pattern::Constant => {
                if self.ctx.node(id)?.is_constant() {
                    Bindings::bind(&mut b.constants, id);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Pattern::Op(p) => self.visit_op(p, id, b),
            Pattern::Alt(first, second) => {
                let mark = b.mark();
                if self.visit(first, id, b)? {
                    return Ok(true);
                }
                b.restore(mark);
                if self.visit(second, id, b)? {
                    return Ok(true);
                }
                b.restore(mark);
                Ok(false)
            }
            Pattern::Optional(layer) => {
                let mark = b.mark();
                if self.visit_op(layer, id, b)? {
                    return Ok(true);
                }
                b.restore(mark);
                // layer absent: the node sits at the pass-through position
                let Some(pass_through) = layer.children.first() else {
                    return Err(PartitionError::MalformedPattern(format!(
                        "optional {} layer has no pass-through argument",
                        layer.op
                    )));
                };
                if self.visit(pass_through, id, b)? {
                    return Ok(true);
                }
                b.restore(mark);
                Ok(false)
            }
        }
    }

    fn visit_op(&self, p: &OpPattern, id: NodeId, b: &mut Bindings) -> PartitionResult<bool> {
        let NodeKind::Call(call) = &self.ctx.node(id)?.kind else {
            return Ok(false);
        };
        if !call.is_op(&p.op) || call.args.len() != p.children.len() {
            return Ok(false);
        }
        for (key, expected) in &p.attrs {
            match call.attrs.get(key) {
                Some(actual) if actual == expected => {}
                Some(_) => return Ok(false),
                None => {
                    return Err(PartitionError::MalformedPattern(format!(
                        "{} at {id} has no attribute '{key}'",
                        p.op
                    )))
                }
            }
        }

        let mark = b.mark();
        Bindings::bind(&mut b.calls, id);
        for (child, &arg) in p.children.iter().zip(call.args.iter()) {
            if !self.visit(child, arg, b)? {
                b.restore(mark);
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Convenience constructor
pub fn matcher<'c, 'f>(ctx: &'c GraphContext<'f>) -> PatternMatcher<'c, 'f> {
    PatternMatcher::new(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Conv2dAttrs, GraphBuilder};
    use crate::ir::{Attrs, Function, Op, Type};
    use crate::pattern::ast::{constant, op, wildcard};
    use crate::tensor::{filled_i32, filled_i8, scalar_f32, scalar_i32, DType};
    use pretty_assertions::assert_eq;

    struct Chain {
        func: Function,
        conv: NodeId,
        bias: Option<NodeId>,
        req: NodeId,
        clip: Option<NodeId>,
    }

    fn make_chain(with_bias: bool, with_clip: bool) -> Chain {
        let mut b = GraphBuilder::new();
        let x = b.var("x", Type::tensor(DType::Int8, vec![1, 8, 8, 4]));
        let w = b.constant(filled_i8(&[3, 3, 4, 8], 1));
        let zp = b.constant(scalar_i32(0));
        let s = b.constant(scalar_f32(0.5));
        let attrs = Conv2dAttrs::nhwc().out_dtype(DType::Int32);
        let conv = b.qnn_conv2d(x, w, zp, zp, s, s, &attrs).unwrap();
        let mut core = conv;
        let mut bias = None;
        if with_bias {
            let bc = b.constant(filled_i32(&[8], 0));
            core = b.bias_add(conv, bc, 3).unwrap();
            bias = Some(core);
        }
        let req = b.requantize(core, s, zp, s, zp, DType::Int8).unwrap();
        let mut out = req;
        let mut clip = None;
        if with_clip {
            out = b.clip(req, -128.0, 127.0).unwrap();
            clip = Some(out);
        }
        Chain {
            func: b.finish(out).unwrap(),
            conv,
            bias,
            req,
            clip,
        }
    }

    fn conv_pattern() -> Pattern {
        let conv = op(
            Op::QnnConv2d,
            vec![wildcard(), constant(), constant(), constant(), constant(), constant()],
        );
        let bias = op(Op::BiasAdd, vec![conv.clone().into(), constant()]);
        op(
            Op::Requantize,
            vec![conv.or(bias), constant(), constant(), constant(), constant()],
        )
        .optional_layer(Op::Clip)
    }

    #[test]
    fn test_full_chain() {
        let chain = make_chain(true, true);
        let ctx = GraphContext::new(&chain.func);
        let clip = chain.clip.unwrap();

        let m = matcher(&ctx).match_at(&conv_pattern(), clip).unwrap().unwrap();
        assert_eq!(m.root, clip);
        assert_eq!(
            m.calls,
            vec![clip, chain.req, chain.bias.unwrap(), chain.conv]
        );
        assert_eq!(m.inputs, vec![NodeId(0)]);
        // w, zp, s and the bias constant, each once
        assert_eq!(m.constants.len(), 4);
        assert_eq!(m.interior().count(), 3);
    }

    #[test]
    fn test_optional_skipped() {
        let chain = make_chain(false, false);
        let ctx = GraphContext::new(&chain.func);

        let m = matcher(&ctx)
            .match_at(&conv_pattern(), chain.req)
            .unwrap()
            .unwrap();
        assert_eq!(m.calls, vec![chain.req, chain.conv]);
    }

    #[test]
    fn test_alternation_restores_bindings() {
        // second branch must not see calls bound by the failed first branch
        let chain = make_chain(false, false);
        let ctx = GraphContext::new(&chain.func);

        let failing = op(
            Op::Requantize,
            vec![
                op(Op::QnnConv2d, vec![constant(); 6]).into(),
                constant(),
                constant(),
                constant(),
                constant(),
            ],
        );
        let p = failing.or(op(Op::Requantize, vec![wildcard(); 5]));
        let m = matcher(&ctx).match_at(&p, chain.req).unwrap().unwrap();
        assert_eq!(m.calls, vec![chain.req]);
        assert!(m.constants.is_empty());
        // conv, scale and zero point; repeated arguments bind once
        assert_eq!(m.inputs, vec![chain.conv, NodeId(3), NodeId(2)]);
    }

    #[test]
    fn test_inner_anchor_does_not_match_outer_pattern() {
        let chain = make_chain(true, true);
        let ctx = GraphContext::new(&chain.func);
        assert!(!matcher(&ctx).matches(&conv_pattern(), chain.conv).unwrap());
    }

    #[test]
    fn test_attr_constraint() {
        let mut b = GraphBuilder::new();
        let x = b.var("x", Type::tensor(DType::Float32, vec![1, 3, 8, 8]));
        let w = b.var("w", Type::tensor(DType::Float32, vec![4, 3, 3, 3]));
        let strided = b
            .conv2d(x, w, &Conv2dAttrs::default().strides(vec![2, 2]))
            .unwrap();
        let plain = b.conv2d(x, w, &Conv2dAttrs::default()).unwrap();
        let func = b.finish(plain).unwrap();
        let ctx = GraphContext::new(&func);

        let p: Pattern = op(Op::Conv2d, vec![wildcard(), wildcard()])
            .has_attr("strides", vec![1i64, 1])
            .into();
        let m = matcher(&ctx);
        assert!(!m.matches(&p, strided).unwrap());
        assert!(m.matches(&p, plain).unwrap());
    }

    #[test]
    fn test_missing_attr_is_malformed() {
        let mut b = GraphBuilder::new();
        let x = b.var("x", Type::tensor(DType::Int8, vec![4]));
        let y = b
            .call(Op::Custom("scale".into()), &[x], Attrs::new())
            .unwrap();
        let func = b.finish(y).unwrap();
        let ctx = GraphContext::new(&func);

        let p: Pattern = op(Op::Custom("scale".into()), vec![wildcard()])
            .has_attr("factor", 2i64)
            .into();
        assert!(matches!(
            matcher(&ctx).match_at(&p, y),
            Err(PartitionError::MalformedPattern(_))
        ));
    }

    #[test]
    fn test_find_all_matches_order() {
        let mut b = GraphBuilder::new();
        let x = b.var("x", Type::tensor(DType::Int8, vec![4]));
        let r0 = b.relu(x).unwrap();
        let r1 = b.relu(r0).unwrap();
        let func = b.finish(r1).unwrap();
        let ctx = GraphContext::new(&func);

        let p: Pattern = op(Op::Relu, vec![wildcard()]).into();
        let roots: Vec<_> = matcher(&ctx)
            .find_all_matches(&p)
            .unwrap()
            .into_iter()
            .map(|m| m.root)
            .collect();
        assert_eq!(roots, vec![r1, r0]);
    }
}

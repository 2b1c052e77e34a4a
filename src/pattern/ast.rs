//! Pattern AST
//!
//! A closed algebra describing subgraph shapes:
//!
//! | Variant | Matches |
//! |---------|---------|
//! | [`Pattern::Wildcard`] | any node, bound as a partition input |
//! | [`Pattern::Constant`] | a `Constant` leaf, embedded into the partition |
//! | [`Pattern::Op`] | a call to one operator with attribute constraints |
//! | [`Pattern::Alt`] | the first branch, else the second |
//! | [`Pattern::Optional`] | an operator layer that may be absent |
//!
//! # Example
//!
//! ```ignore
//! use rvx_partition::pattern::{constant, op, wildcard};
//!
//! // requantize(conv2d(...) | bias_add(conv2d(...), c), ...) with optional clip
//! let conv = op(Op::QnnConv2d, vec![wildcard(), constant(), constant(), constant(), constant(), constant()]);
//! let bias = op(Op::BiasAdd, vec![conv.clone().into(), constant()]);
//! let req = op(Op::Requantize, vec![Pattern::from(conv).or(bias), constant(), constant(), constant(), constant()]);
//! let pattern = req.optional_layer(Op::Clip);
//! ```

use std::fmt;

use crate::error::{PartitionError, PartitionResult};
use crate::ir::{AttrValue, Attrs, Op};

/// Operator-call pattern
#[derive(Debug, Clone, PartialEq)]
pub struct OpPattern {
    /// Operator the call must invoke
    pub op: Op,
    /// Argument patterns, matched positionally
    pub children: Vec<Pattern>,
    /// Attributes the call must carry with exactly these values
    pub attrs: Attrs,
}

impl OpPattern {
    /// Require an attribute value
    pub fn has_attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    /// This pattern, or `other` when it does not match
    pub fn or(self, other: impl Into<Pattern>) -> Pattern {
        Pattern::from(self).or(other)
    }

    /// Wrap this pattern in an operator layer that may be absent
    pub fn optional_layer(self, op: Op) -> Pattern {
        Pattern::from(self).optional_layer(op)
    }

    fn validate(&self) -> PartitionResult<()> {
        if let Some(arity) = self.op.arity() {
            if arity != self.children.len() {
                return Err(PartitionError::MalformedPattern(format!(
                    "{} takes {arity} arguments, pattern gives {}",
                    self.op,
                    self.children.len()
                )));
            }
        }
        if let Some(schema) = self.op.attr_schema() {
            if let Some(key) = self.attrs.keys().find(|k| !schema.contains(&k.as_str())) {
                return Err(PartitionError::MalformedPattern(format!(
                    "{} has no attribute '{key}'",
                    self.op
                )));
            }
        }
        self.children.iter().try_for_each(Pattern::validate)
    }
}

/// Subgraph pattern
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// Any single node
    Wildcard,
    /// A constant leaf
    Constant,
    /// An operator call
    Op(OpPattern),
    /// First branch, else second
    Alt(Box<Pattern>, Box<Pattern>),
    /// A layer that may be skipped
    ///
    /// When the layer is absent the node is matched against the layer's
    /// first child instead.
    Optional(Box<OpPattern>),
}

/// Match any node
pub fn wildcard() -> Pattern {
    Pattern::Wildcard
}

/// Match a constant leaf
pub fn constant() -> Pattern {
    Pattern::Constant
}

/// Match a call to `op` whose arguments match `children`
pub fn op(op: Op, children: Vec<Pattern>) -> OpPattern {
    OpPattern {
        op,
        children,
        attrs: Attrs::new(),
    }
}

impl Pattern {
    /// This pattern, or `other` when it does not match
    pub fn or(self, other: impl Into<Pattern>) -> Pattern {
        Pattern::Alt(Box::new(self), Box::new(other.into()))
    }

    /// `op(self)` when present, `self` otherwise
    pub fn optional_layer(self, layer: Op) -> Pattern {
        Pattern::Optional(Box::new(op(layer, vec![self])))
    }

    /// Check arities and attribute keys against the operator schemas
    pub fn validate(&self) -> PartitionResult<()> {
        match self {
            Pattern::Wildcard | Pattern::Constant => Ok(()),
            Pattern::Op(p) => p.validate(),
            Pattern::Alt(a, b) => {
                a.validate()?;
                b.validate()
            }
            Pattern::Optional(layer) => {
                if layer.children.is_empty() {
                    return Err(PartitionError::MalformedPattern(format!(
                        "optional {} layer has no pass-through argument",
                        layer.op
                    )));
                }
                layer.validate()
            }
        }
    }

    /// Number of operator patterns, counting both alternatives
    pub fn op_count(&self) -> usize {
        match self {
            Pattern::Wildcard | Pattern::Constant => 0,
            Pattern::Op(p) => 1 + p.children.iter().map(Pattern::op_count).sum::<usize>(),
            Pattern::Alt(a, b) => a.op_count() + b.op_count(),
            Pattern::Optional(layer) => {
                1 + layer.children.iter().map(Pattern::op_count).sum::<usize>()
            }
        }
    }
}

impl From<OpPattern> for Pattern {
    fn from(p: OpPattern) -> Self {
        Pattern::Op(p)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Wildcard => write!(f, "*"),
            Pattern::Constant => write!(f, "const"),
            Pattern::Op(p) => write!(f, "{p}"),
            Pattern::Alt(a, b) => write!(f, "({a} | {b})"),
            Pattern::Optional(layer) => write!(f, "{layer}?"),
        }
    }
}

impl fmt::Display for OpPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.op)?;
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{child}")?;
        }
        write!(f, ")")?;
        if !self.attrs.is_empty() {
            let attrs: Vec<String> = self.attrs.iter().map(|(k, v)| format!("{k}={v}")).collect();
            write!(f, "[{}]", attrs.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let p = op(Op::Clip, vec![wildcard()]).or(constant());
        assert_eq!(p.to_string(), "(clip(*) | const)");

        let p = op(Op::Relu, vec![wildcard()]).optional_layer(Op::Clip);
        assert_eq!(p.to_string(), "clip(nn.relu(*))?");
    }

    #[test]
    fn test_validate_arity() {
        let bad: Pattern = op(Op::QnnConv2d, vec![wildcard(), wildcard()]).into();
        assert!(matches!(
            bad.validate(),
            Err(PartitionError::MalformedPattern(_))
        ));

        // custom operators take any arity
        let ok: Pattern = op(Op::Custom("concat".into()), vec![wildcard(); 3]).into();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_validate_attr_key() {
        let ok: Pattern = op(Op::Conv2d, vec![wildcard(), wildcard()])
            .has_attr("groups", 1i64)
            .into();
        assert!(ok.validate().is_ok());

        let bad: Pattern = op(Op::Conv2d, vec![wildcard(), wildcard()])
            .has_attr("momentum", 1i64)
            .into();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_validate_nested_alternation() {
        let inner = op(Op::BiasAdd, vec![wildcard()]);
        let p = op(Op::Relu, vec![wildcard()]).or(inner);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_optional_needs_pass_through() {
        let p = Pattern::Optional(Box::new(op(Op::Custom("nop".into()), vec![])));
        assert!(matches!(
            p.validate(),
            Err(PartitionError::MalformedPattern(_))
        ));
    }

    #[test]
    fn test_op_count() {
        let conv = op(Op::QnnDense, vec![wildcard(); 6]);
        let bias = op(Op::BiasAdd, vec![conv.clone().into(), constant()]);
        let p = op(
            Op::Requantize,
            vec![conv.or(bias), constant(), constant(), constant(), constant()],
        )
        .optional_layer(Op::Clip);
        // clip + requantize + dense + bias_add + dense
        assert_eq!(p.op_count(), 5);
    }
}

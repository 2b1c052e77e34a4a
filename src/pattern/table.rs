//! Ordered pattern tables
//!
//! A [`PatternTable`] is built once, before matching starts, and passed by
//! reference into partitioning. Entry order is priority order.

use std::fmt;

use crate::error::{PartitionError, PartitionResult};
use crate::graph::GraphContext;
use crate::ir::NodeId;

use super::ast::Pattern;

/// Legality predicate over the root of a structural match
///
/// `Ok(false)` keeps the candidate on the host. Errors are reserved for
/// broken preconditions such as missing types.
pub type Predicate = Box<dyn Fn(&GraphContext<'_>, NodeId) -> PartitionResult<bool> + Send + Sync>;

/// A named pattern with its legality predicate
pub struct PatternEntry {
    /// Composite name, e.g. `rvx.qnn_conv2d`
    pub name: String,
    /// Structural pattern
    pub pattern: Pattern,
    predicate: Predicate,
}

impl PatternEntry {
    /// Create an entry
    pub fn new<F>(name: impl Into<String>, pattern: Pattern, predicate: F) -> Self
    where
        F: Fn(&GraphContext<'_>, NodeId) -> PartitionResult<bool> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            pattern,
            predicate: Box::new(predicate),
        }
    }

    /// Create an entry whose predicate accepts every structural match
    pub fn accepting(name: impl Into<String>, pattern: Pattern) -> Self {
        Self::new(name, pattern, |_, _| Ok(true))
    }

    /// Run the legality predicate on a matched root
    pub fn check(&self, ctx: &GraphContext<'_>, root: NodeId) -> PartitionResult<bool> {
        (self.predicate)(ctx, root)
    }
}

impl fmt::Debug for PatternEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternEntry")
            .field("name", &self.name)
            .field("pattern", &self.pattern.to_string())
            .finish_non_exhaustive()
    }
}

/// Ordered list of pattern entries
#[derive(Debug, Default)]
pub struct PatternTable {
    entries: Vec<PatternEntry>,
}

impl PatternTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the lowest priority
    ///
    /// The pattern is validated against the operator schemas and the name
    /// must be unique.
    pub fn push(&mut self, entry: PatternEntry) -> PartitionResult<()> {
        entry.pattern.validate().map_err(|e| match e {
            PartitionError::MalformedPattern(msg) => {
                PartitionError::MalformedPattern(format!("{}: {msg}", entry.name))
            }
            other => other,
        })?;
        if self.get(&entry.name).is_some() {
            return Err(PartitionError::MalformedPattern(format!(
                "duplicate pattern name {}",
                entry.name
            )));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Builder form of [`PatternTable::push`]
    pub fn with(mut self, entry: PatternEntry) -> PartitionResult<Self> {
        self.push(entry)?;
        Ok(self)
    }

    /// Look up an entry by name
    pub fn get(&self, name: &str) -> Option<&PatternEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Entries in priority order
    pub fn iter(&self) -> impl Iterator<Item = &PatternEntry> {
        self.entries.iter()
    }

    /// Entry names in priority order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a PatternTable {
    type Item = &'a PatternEntry;
    type IntoIter = std::slice::Iter<'a, PatternEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Op;
    use crate::pattern::ast::{op, wildcard};

    #[test]
    fn test_push_keeps_order() {
        let table = PatternTable::new()
            .with(PatternEntry::accepting("t.relu", op(Op::Relu, vec![wildcard()]).into()))
            .unwrap()
            .with(PatternEntry::accepting("t.clip", op(Op::Clip, vec![wildcard()]).into()))
            .unwrap();
        assert_eq!(table.names(), vec!["t.relu", "t.clip"]);
        assert_eq!(table.len(), 2);
        assert!(table.get("t.clip").is_some());
    }

    #[test]
    fn test_push_validates() {
        let mut table = PatternTable::new();
        let err = table
            .push(PatternEntry::accepting(
                "t.bad",
                op(Op::BiasAdd, vec![wildcard()]).into(),
            ))
            .unwrap_err();
        assert!(matches!(err, PartitionError::MalformedPattern(ref m) if m.starts_with("t.bad")));
        assert!(table.is_empty());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut table = PatternTable::new();
        let entry = || PatternEntry::accepting("t.relu", op(Op::Relu, vec![wildcard()]).into());
        table.push(entry()).unwrap();
        assert!(table.push(entry()).is_err());
    }

    #[test]
    fn test_predicate_runs() {
        use crate::builder::GraphBuilder;
        use crate::ir::Type;
        use crate::tensor::DType;

        let mut b = GraphBuilder::new();
        let x = b.var("x", Type::tensor(DType::Int8, vec![4]));
        let r = b.relu(x).unwrap();
        let func = b.finish(r).unwrap();
        let ctx = GraphContext::new(&func);

        let entry = PatternEntry::new("t.relu", op(Op::Relu, vec![wildcard()]).into(), |ctx, root| {
            Ok(ctx.is_output(root))
        });
        assert!(entry.check(&ctx, r).unwrap());
        assert!(!entry.check(&ctx, x).unwrap());
    }
}

//! Pattern matching module
//!
//! This module provides the tools for identifying offloadable subgraphs:
//!
//! - [`ast`]: the pattern algebra (wildcard, constant, operator,
//!   alternation, optional layer)
//! - [`matcher`]: structural matching against a [`GraphContext`](crate::graph::GraphContext)
//! - [`table`]: ordered `(name, pattern, predicate)` entries
//! - [`library`]: the built-in tables
//!
//! # Overview
//!
//! The matching system works by:
//! 1. Building a pattern table once, before any matching
//! 2. Matching patterns from an anchor node toward its inputs
//! 3. Gating each structural match with the entry's legality predicate
//!
//! # Example
//!
//! ```ignore
//! use rvx_partition::pattern::{build_pattern_table, PatternMatcher};
//!
//! let table = build_pattern_table("rvx")?;
//! let matcher = PatternMatcher::new(&ctx);
//!
//! for entry in &table {
//!     if let Some(m) = matcher.match_at(&entry.pattern, anchor)? {
//!         if entry.check(&ctx, m.root)? {
//!             println!("{} matched at {}", entry.name, m.root);
//!         }
//!     }
//! }
//! ```

pub mod ast;
pub mod library;
pub mod matcher;
pub mod table;

// Re-export main types
pub use ast::{constant, op, wildcard, OpPattern, Pattern};
pub use library::{
    build_conv2d_pattern, build_dense_pattern, build_pattern_table, build_requantize_pattern,
    build_uma_pattern_table, build_uma_qnn_conv2d_pattern, qnn_conv2d_pattern,
    qnn_fully_connected_pattern,
};
pub use matcher::{matcher, MatchResult, PatternMatcher};
pub use table::{PatternEntry, PatternTable, Predicate};

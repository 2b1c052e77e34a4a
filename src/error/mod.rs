//! Error types for rvx-partition
//!
//! This module defines all error types used throughout the crate.
//!
//! A legality predicate returning `false` is never an error: that is the
//! normal "stays on the host" outcome. The variants below cover broken
//! preconditions (missing types), construction defects (malformed patterns)
//! and consistency failures of the rewrite itself.

use thiserror::Error;

/// Main error type for partitioning operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PartitionError {
    /// Matching or legality evaluation reached a node without a checked type
    #[error("Missing type information for node {node} ({context}); run type inference first")]
    MissingTypeInfo {
        /// Node index inside its function
        node: usize,
        /// Where the type was required
        context: String,
    },

    /// Pattern references an arity or attribute the operator does not have
    #[error("Malformed pattern: {0}")]
    MalformedPattern(String),

    /// Extracting a partition would route a value back into itself
    #[error("Partition {partition} would create a cycle through external input node {input}")]
    PartitionCycle {
        /// Name of the partition function being extracted
        partition: String,
        /// Offending external input node
        input: usize,
    },

    /// Two types that must agree do not
    #[error("Type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Where the comparison happened
        context: String,
        /// Expected type (display form)
        expected: String,
        /// Actual type (display form)
        found: String,
    },

    /// Type inference could not assign a type
    #[error("Type inference failed: {0}")]
    TypeInference(String),

    /// Constant payload could not be read as requested
    #[error("Invalid constant: {0}")]
    InvalidConstant(String),

    /// Callee function not present in the module
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Graph violates a structural invariant
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for partitioning operations
pub type PartitionResult<T> = Result<T, PartitionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PartitionError::MalformedPattern("qnn.conv2d expects 6 args".to_string());
        assert!(err.to_string().contains("qnn.conv2d"));
    }

    #[test]
    fn test_missing_type_info_mentions_node() {
        let err = PartitionError::MissingTypeInfo {
            node: 7,
            context: "legality".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains('7'));
        assert!(msg.contains("legality"));
    }

    #[test]
    fn test_partition_cycle() {
        let err = PartitionError::PartitionCycle {
            partition: "default_rvx_main_0".to_string(),
            input: 3,
        };
        assert!(err.to_string().contains("default_rvx_main_0"));
    }
}

//! Core traits for rvx-partition
//!
//! Defines the module-level pass interface every rewrite implements.

use crate::error::PartitionResult;
use crate::ir::IrModule;

/// Pass trait for module transformations
///
/// This is the core abstraction for all module-level rewrites. A pass
/// consumes a module and returns the rewritten module; the input value is
/// never shared with other passes.
///
/// # Example
///
/// ```ignore
/// struct Identity;
///
/// impl Pass for Identity {
///     fn name(&self) -> &'static str {
///         "Identity"
///     }
///
///     fn run(&self, module: IrModule) -> PartitionResult<IrModule> {
///         Ok(module)
///     }
/// }
/// ```
pub trait Pass {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Run the pass over `module`
    fn run(&self, module: IrModule) -> PartitionResult<IrModule>;
}

/// Chainable pass that applies multiple passes in sequence
pub struct PassChain {
    passes: Vec<Box<dyn Pass>>,
}

impl PassChain {
    /// Create a new empty pass chain
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    /// Add a pass to the chain
    #[allow(clippy::should_implement_trait)]
    pub fn add<P: Pass + 'static>(mut self, pass: P) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Names of the chained passes, in run order
    pub fn names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Number of chained passes
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Default for PassChain {
    fn default() -> Self {
        Self::new()
    }
}

impl Pass for PassChain {
    fn name(&self) -> &'static str {
        "PassChain"
    }

    fn run(&self, mut module: IrModule) -> PartitionResult<IrModule> {
        for pass in &self.passes {
            tracing::debug!(pass = pass.name(), "running pass");
            module = pass.run(module)?;
        }
        Ok(module)
    }
}

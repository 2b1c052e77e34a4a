//! Core partitioning loop
//!
//! Drives one partition run over a module: bind parameters, then for every
//! host function merge composites, annotate, compute components and
//! extract; finally verify the rewritten module's types.

use tracing::{debug, info};

use crate::error::{PartitionError, PartitionResult};
use crate::graph::GraphContext;
use crate::infer::infer_module;
use crate::ir::IrModule;
use crate::pattern::{build_pattern_table, PatternTable};
use crate::traits::{Pass, PassChain};

use super::annotate::annotate;
use super::components::connected_components;
use super::extract::{boundary_signature, build_partition_function, rewrite_host, Partition};
use super::merge::merge_composite;
use super::params::{BindParams, Params};
use super::verify::verify_partitioned;

/// Partition configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionConfig {
    /// Accelerator target; prefixes composite names and owns partitions
    pub target: String,
    /// Module name used in partition function names
    pub mod_name: String,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            target: crate::DEFAULT_TARGET.to_string(),
            mod_name: "default".to_string(),
        }
    }
}

impl PartitionConfig {
    /// Set the target
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Set the module name
    pub fn with_mod_name(mut self, mod_name: impl Into<String>) -> Self {
        self.mod_name = mod_name.into();
        self
    }

    /// Name of the `n`-th partition function
    pub fn partition_name(&self, n: usize) -> String {
        format!("{}_{}_main_{n}", self.mod_name, self.target)
    }
}

/// Statistics from a partition run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PartitionStats {
    /// Call nodes offered as anchors
    pub anchors_visited: usize,
    /// (anchor, entry) pairs evaluated
    pub patterns_attempted: usize,
    /// Structural matches refused before legality
    pub structural_rejections: usize,
    /// Structural matches refused by a predicate
    pub legality_rejections: usize,
    /// Partition functions added to the module
    pub partitions_created: usize,
}

/// Partition `module` for the `rvx` target with the built-in table
///
/// Every reachable node of every host function must already carry a
/// checked type.
///
/// # Example
///
/// ```ignore
/// let typed = infer_module(&module)?;
/// let partitioned = partition(&typed, None, "default")?;
/// assert!(partitioned.get("default_rvx_main_0").is_ok());
/// ```
pub fn partition(
    module: &IrModule,
    params: Option<&Params>,
    mod_name: &str,
) -> PartitionResult<IrModule> {
    let config = PartitionConfig::default().with_mod_name(mod_name);
    let table = build_pattern_table(&config.target)?;
    partition_with(module, params, &table, &config).map(|(module, _)| module)
}

/// Partition `module` with an explicit table and configuration
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(compiler = %config.target, mod_name = %config.mod_name, entries = table.len())
)]
pub fn partition_with(
    module: &IrModule,
    params: Option<&Params>,
    table: &PatternTable,
    config: &PartitionConfig,
) -> PartitionResult<(IrModule, PartitionStats)> {
    let module = match params {
        Some(params) => BindParams::new(params.clone()).run(module.clone())?,
        None => module.clone(),
    };

    let mut stats = PartitionStats::default();
    let mut next = module.functions.values().filter(|f| f.is_partition()).count();
    let mut rewritten = module.clone();
    let mut extracted = Vec::new();
    let mut signatures = Vec::new();

    for name in module.host_functions() {
        let func = module.get(&name)?;
        let ctx = GraphContext::new(func);
        ctx.require_types()?;

        let accepted = merge_composite(&ctx, table, &mut stats)?;
        if accepted.is_empty() {
            debug!(function = name.as_str(), "nothing to offload");
            continue;
        }
        let annotation = annotate(&ctx, &accepted, &config.target);
        let mut components = connected_components(&ctx, &annotation, &accepted)?;
        // number partitions in program order
        components.sort_by_key(|c| c.root);

        let mut partitions = Vec::with_capacity(components.len());
        for component in components {
            let mut partition_name = config.partition_name(next);
            while module.functions.contains_key(&partition_name) {
                next += 1;
                partition_name = config.partition_name(next);
            }
            next += 1;
            component.check_acyclic(&ctx, &partition_name)?;

            let composite = accepted
                .get(component.region)
                .map(|m| m.composite.clone())
                .ok_or_else(|| {
                    PartitionError::Internal(format!("region {} has no match", component.region))
                })?;
            partitions.push(Partition {
                name: partition_name,
                composite,
                component,
            });
        }

        for p in &partitions {
            signatures.push(boundary_signature(&ctx, p)?);
            extracted.push((p.name.clone(), build_partition_function(&ctx, p, &config.target)?));
        }
        rewritten.insert(name.clone(), rewrite_host(&ctx, &partitions)?);
    }

    if extracted.is_empty() {
        return Ok((module, stats));
    }
    stats.partitions_created = extracted.len();
    for (name, func) in extracted {
        rewritten.insert(name, func);
    }

    let verified = verify_partitioned(&rewritten, &signatures)?;
    info!(
        partitions = stats.partitions_created,
        anchors = stats.anchors_visited,
        legality_rejections = stats.legality_rejections,
        "partitioning complete"
    );
    Ok((verified, stats))
}

/// Pass running type inference over the whole module
#[derive(Debug, Clone, Copy, Default)]
pub struct InferType;

impl Pass for InferType {
    fn name(&self) -> &'static str {
        "InferType"
    }

    fn run(&self, module: IrModule) -> PartitionResult<IrModule> {
        infer_module(&module)
    }
}

/// Pass extracting accelerator partitions
#[derive(Debug)]
pub struct PartitionGraph {
    table: PatternTable,
    config: PartitionConfig,
}

impl PartitionGraph {
    /// Create a pass partitioning with `table`
    pub fn new(table: PatternTable, config: PartitionConfig) -> Self {
        Self { table, config }
    }

    /// The built-in table for `config.target`
    pub fn with_config(config: PartitionConfig) -> PartitionResult<Self> {
        Ok(Self::new(build_pattern_table(&config.target)?, config))
    }

    /// Configuration of this pass
    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }
}

impl Pass for PartitionGraph {
    fn name(&self) -> &'static str {
        "PartitionGraph"
    }

    fn run(&self, module: IrModule) -> PartitionResult<IrModule> {
        partition_with(&module, None, &self.table, &self.config).map(|(module, _)| module)
    }
}

/// Bind, infer, partition: the full offload pipeline for `config`
pub fn partition_pipeline(params: Params, config: PartitionConfig) -> PartitionResult<PassChain> {
    Ok(PassChain::new()
        .add(BindParams::new(params))
        .add(InferType)
        .add(PartitionGraph::with_config(config)?))
}

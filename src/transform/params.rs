//! Parameter binding
//!
//! Replaces named parameters of `main` with constants so weights and zero
//! points become visible to constant patterns and legality checks.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{PartitionError, PartitionResult};
use crate::ir::{Function, IrModule, NodeKind, Type, ENTRY};
use crate::tensor::TensorData;
use crate::traits::Pass;

/// Constant values by parameter name
pub type Params = IndexMap<String, TensorData>;

/// Bind `params` into `func`
///
/// Every parameter whose name appears in `params` becomes a typed constant
/// in place and leaves the parameter list. Names that match no parameter
/// are ignored. The constant's dtype and shape must equal the declared type.
pub fn bind_params_by_name(func: &Function, params: &Params) -> PartitionResult<Function> {
    let mut bound = func.clone();
    let mut kept = Vec::with_capacity(func.params.len());

    for &id in &func.params {
        let NodeKind::Var { name, ty } = &func.node(id)?.kind else {
            return Err(PartitionError::InvalidGraph(format!(
                "parameter {id} is not a variable"
            )));
        };
        let Some(data) = params.get(name) else {
            kept.push(id);
            continue;
        };

        let provided = Type::tensor(data.dtype(), data.shape());
        if &provided != ty {
            return Err(PartitionError::TypeMismatch {
                context: format!("binding parameter {name}"),
                expected: ty.to_string(),
                found: provided.to_string(),
            });
        }

        debug!(%id, name = name.as_str(), "bound parameter");
        let node = bound.node_mut(id)?;
        node.kind = NodeKind::Constant(data.clone());
        node.checked_type = Some(provided);
    }

    bound.params = kept;
    Ok(bound)
}

/// Pass binding constants into `main`
#[derive(Debug, Clone, Default)]
pub struct BindParams {
    params: Params,
}

impl BindParams {
    /// Create a pass binding `params`
    pub fn new(params: Params) -> Self {
        Self { params }
    }
}

impl Pass for BindParams {
    fn name(&self) -> &'static str {
        "BindParams"
    }

    fn run(&self, mut module: IrModule) -> PartitionResult<IrModule> {
        if self.params.is_empty() {
            return Ok(module);
        }
        let main = module.get_mut(ENTRY)?;
        *main = bind_params_by_name(main, &self.params)?;
        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::ir::{Attrs, NodeId, Op};
    use crate::tensor::{filled_i8, DType};

    fn make_test_function() -> Function {
        let mut b = GraphBuilder::new();
        let x = b.var("x", Type::tensor(DType::Int8, vec![1, 4]));
        let w = b.var("w", Type::tensor(DType::Int8, vec![2, 4]));
        let out = b.call(Op::Custom("my.op".into()), &[x, w], Attrs::new()).unwrap();
        b.finish(out).unwrap()
    }

    #[test]
    fn test_bind_replaces_var_in_place() {
        let f = make_test_function();
        let mut params = Params::new();
        params.insert("w".to_string(), filled_i8(&[2, 4], 1));
        params.insert("unused".to_string(), filled_i8(&[1], 0));

        let bound = bind_params_by_name(&f, &params).unwrap();
        assert_eq!(bound.params.len(), 1);
        let w = bound.node(NodeId(1)).unwrap();
        assert!(w.is_constant());
        assert_eq!(
            w.checked_type,
            Some(Type::tensor(DType::Int8, vec![2, 4]))
        );
        assert_eq!(bound.len(), f.len());
    }

    #[test]
    fn test_bind_rejects_shape_mismatch() {
        let f = make_test_function();
        let mut params = Params::new();
        params.insert("w".to_string(), filled_i8(&[4, 2], 1));

        let err = bind_params_by_name(&f, &params).unwrap_err();
        assert!(matches!(err, PartitionError::TypeMismatch { .. }));
    }

    #[test]
    fn test_bind_pass_targets_main() {
        let module = IrModule::from_main(make_test_function());
        let mut params = Params::new();
        params.insert("x".to_string(), filled_i8(&[1, 4], 0));

        let out = BindParams::new(params).run(module).unwrap();
        assert_eq!(out.main().unwrap().params, vec![NodeId(1)]);
    }
}

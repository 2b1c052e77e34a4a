//! Post-extraction type verification
//!
//! The rewritten module still carries the checked types of the graph it was
//! cut from. Inference is re-run from scratch and every node must come back
//! with exactly the type it carried; every partition must expose the
//! boundary signature of the values it replaced.

use tracing::debug;

use crate::error::{PartitionError, PartitionResult};
use crate::infer::infer_module;
use crate::ir::{IrModule, Type};

use super::extract::BoundarySignature;

fn mismatch(context: String, expected: &Type, found: Option<&Type>) -> PartitionError {
    PartitionError::TypeMismatch {
        context,
        expected: expected.to_string(),
        found: found.map_or_else(|| "<untyped>".to_string(), Type::to_string),
    }
}

/// Re-infer `rewritten` and compare it with the carried types
///
/// Returns the freshly inferred module.
#[tracing::instrument(level = "debug", skip_all, fields(partitions = signatures.len()))]
pub fn verify_partitioned(
    rewritten: &IrModule,
    signatures: &[BoundarySignature],
) -> PartitionResult<IrModule> {
    let inferred = infer_module(rewritten)?;

    for (name, carried) in &rewritten.functions {
        let fresh = inferred.get(name)?;
        for (id, node) in carried.iter() {
            let Some(expected) = &node.checked_type else {
                continue;
            };
            let found = fresh.node(id)?.checked_type.as_ref();
            if found != Some(expected) {
                return Err(mismatch(format!("{name} node {id}"), expected, found));
            }
        }
    }

    for sig in signatures {
        let func = inferred.get(&sig.partition)?;
        let params = func.param_types()?;
        if params.len() != sig.params.len() {
            return Err(PartitionError::TypeMismatch {
                context: format!("{} parameter count", sig.partition),
                expected: sig.params.len().to_string(),
                found: params.len().to_string(),
            });
        }
        for (i, (expected, found)) in sig.params.iter().zip(&params).enumerate() {
            if expected != found {
                return Err(mismatch(
                    format!("{} parameter {i}", sig.partition),
                    expected,
                    Some(found),
                ));
            }
        }
        let ret = func.ret_type();
        if ret != Some(&sig.ret) {
            return Err(mismatch(format!("{} result", sig.partition), &sig.ret, ret));
        }
    }

    debug!(functions = inferred.functions.len(), "types preserved");
    Ok(inferred)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::infer::infer_function_standalone;
    use crate::ir::NodeId;
    use crate::tensor::DType;

    fn make_typed_module() -> IrModule {
        let mut b = GraphBuilder::new();
        let x = b.var("x", Type::tensor(DType::Int8, vec![4]));
        let r = b.relu(x).unwrap();
        IrModule::from_main(infer_function_standalone(&b.finish(r).unwrap()).unwrap())
    }

    #[test]
    fn test_consistent_module_verifies() {
        let module = make_typed_module();
        let verified = verify_partitioned(&module, &[]).unwrap();
        assert_eq!(verified, module);
    }

    #[test]
    fn test_carried_type_mismatch() {
        let mut module = make_typed_module();
        module.get_mut("main").unwrap().node_mut(NodeId(1)).unwrap().checked_type =
            Some(Type::tensor(DType::Int32, vec![4]));

        let err = verify_partitioned(&module, &[]).unwrap_err();
        match err {
            PartitionError::TypeMismatch { context, .. } => assert!(context.contains("%1")),
            other => panic!("expected a type mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_signature_mismatch() {
        let mut module = make_typed_module();
        let mut part = module.main().unwrap().clone();
        part.attrs.compiler = Some("t".to_string());
        module.insert("p", part);

        let sig = BoundarySignature {
            partition: "p".to_string(),
            params: vec![Type::tensor(DType::Int8, vec![4])],
            ret: Type::tensor(DType::Int8, vec![8]),
        };
        let err = verify_partitioned(&module, &[sig]).unwrap_err();
        assert!(matches!(err, PartitionError::TypeMismatch { .. }));
    }
}

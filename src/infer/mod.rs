//! Type inference
//!
//! Populates `checked_type` on every node of every function. Partitioning
//! consumes these types as a precondition and re-runs inference afterwards
//! to confirm that extraction preserved them.
//!
//! # Example
//!
//! ```ignore
//! use rvx_partition::infer::infer_module;
//!
//! let typed = infer_module(&module)?;
//! assert!(typed.main()?.ret_type().is_some());
//! ```

pub mod ops;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::error::{PartitionError, PartitionResult};
use crate::ir::{Callee, Function, IrModule, NodeId, NodeKind, Type};

pub use ops::{infer_op, out_dtype};

/// Infer types for every function of a module
///
/// Returns a copy; the input is left untouched. Functions are inferred on
/// demand so a caller is typed after its callees.
#[tracing::instrument(level = "debug", skip_all, fields(functions = module.functions.len()))]
pub fn infer_module(module: &IrModule) -> PartitionResult<IrModule> {
    let mut inferer = Inferer::new(module);
    for name in module.functions.keys() {
        inferer.resolve(name)?;
    }
    // keep the module's function order
    let mut functions = IndexMap::with_capacity(module.functions.len());
    for name in module.functions.keys() {
        if let Some(func) = inferer.done.swap_remove(name) {
            functions.insert(name.clone(), func);
        }
    }
    Ok(IrModule { functions })
}

/// Infer types for one function of `module`
pub fn infer_function(func: &Function, module: &IrModule) -> PartitionResult<Function> {
    Inferer::new(module).infer_body("<anonymous>", func)
}

/// Infer types for a function that calls no other function
pub fn infer_function_standalone(func: &Function) -> PartitionResult<Function> {
    infer_function(func, &IrModule::default())
}

struct Inferer<'m> {
    module: &'m IrModule,
    done: IndexMap<String, Function>,
    in_progress: FxHashSet<String>,
}

impl<'m> Inferer<'m> {
    fn new(module: &'m IrModule) -> Self {
        Self {
            module,
            done: IndexMap::new(),
            in_progress: FxHashSet::default(),
        }
    }

    /// Infer `name` if needed and hand back its parameter and return types
    fn resolve(&mut self, name: &str) -> PartitionResult<(Vec<Type>, Type)> {
        if !self.done.contains_key(name) {
            if !self.in_progress.insert(name.to_string()) {
                return Err(PartitionError::TypeInference(format!(
                    "recursive call to {name} is not supported"
                )));
            }
            let module = self.module;
            let func = module.get(name)?;
            let typed = self.infer_body(name, func)?;
            self.in_progress.remove(name);
            self.done.insert(name.to_string(), typed);
        }
        let func = self
            .done
            .get(name)
            .ok_or_else(|| PartitionError::Internal(format!("{name} vanished during inference")))?;
        let ret = func.ret_type().cloned().ok_or_else(|| {
            PartitionError::TypeInference(format!("{name} has no result type"))
        })?;
        Ok((func.param_types()?, ret))
    }

    fn infer_body(&mut self, name: &str, func: &Function) -> PartitionResult<Function> {
        func.validate()?;
        let mut typed = func.clone();
        for index in 0..typed.nodes.len() {
            let id = NodeId::from(index);
            let ty = self.infer_node(name, &typed, id)?;
            typed.node_mut(id)?.checked_type = Some(ty);
        }
        Ok(typed)
    }

    fn infer_node(&mut self, name: &str, func: &Function, id: NodeId) -> PartitionResult<Type> {
        let node = func.node(id)?;
        let arg_type = |arg: NodeId| checked(func, arg, id, name);

        match &node.kind {
            NodeKind::Var { ty, .. } => Ok(ty.clone()),
            NodeKind::Constant(data) => Ok(Type::tensor(data.dtype(), data.shape())),
            NodeKind::TupleGetItem { tuple, index } => match arg_type(*tuple)? {
                Type::Tuple(fields) => fields.get(*index).cloned().ok_or_else(|| {
                    PartitionError::TypeInference(format!(
                        "tuple index {index} out of range at {id} in {name}"
                    ))
                }),
                other => Err(PartitionError::TypeInference(format!(
                    "{id} in {name} projects out of non-tuple {other}"
                ))),
            },
            NodeKind::Call(call) => {
                let args = call
                    .args
                    .iter()
                    .map(|&a| arg_type(a))
                    .collect::<PartitionResult<Vec<_>>>()?;
                match &call.callee {
                    Callee::Op(op) => infer_op(op, call, &args)
                        .map_err(|e| match e {
                            PartitionError::TypeInference(msg) => {
                                PartitionError::TypeInference(format!("{msg} (at {id} in {name})"))
                            }
                            other => other,
                        })?
                        .ok_or_else(|| PartitionError::MissingTypeInfo {
                            node: id.index(),
                            context: format!("{op} has no type rule and no annotation"),
                        }),
                    Callee::Global(callee) => {
                        let arg_types: Vec<Type> = args.into_iter().cloned().collect();
                        let (params, ret) = self.resolve(callee)?;
                        if params != arg_types {
                            return Err(PartitionError::TypeMismatch {
                                context: format!("call to {callee} at {id} in {name}"),
                                expected: display_types(&params),
                                found: display_types(&arg_types),
                            });
                        }
                        Ok(ret)
                    }
                }
            }
        }
    }
}

fn checked<'f>(
    func: &'f Function,
    arg: NodeId,
    user: NodeId,
    name: &str,
) -> PartitionResult<&'f Type> {
    func.node(arg)?
        .checked_type
        .as_ref()
        .ok_or_else(|| PartitionError::MissingTypeInfo {
            node: arg.index(),
            context: format!("argument of {user} in {name}"),
        })
}

fn display_types(types: &[Type]) -> String {
    let parts: Vec<String> = types.iter().map(ToString::to_string).collect();
    format!("({})", parts.join(", "))
}

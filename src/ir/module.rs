//! Modules: named collections of functions

use indexmap::IndexMap;

use crate::error::{PartitionError, PartitionResult};

use super::function::Function;

/// Name of the entry function
pub const ENTRY: &str = "main";

/// A program: functions in insertion order, `main` is the entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IrModule {
    /// Functions by name
    pub functions: IndexMap<String, Function>,
}

impl IrModule {
    /// Create a module holding a single `main` function
    pub fn from_main(main: Function) -> Self {
        let mut functions = IndexMap::new();
        functions.insert(ENTRY.to_string(), main);
        Self { functions }
    }

    /// Get a function by name
    pub fn get(&self, name: &str) -> PartitionResult<&Function> {
        self.functions
            .get(name)
            .ok_or_else(|| PartitionError::UnknownFunction(name.to_string()))
    }

    /// Get a mutable function by name
    pub fn get_mut(&mut self, name: &str) -> PartitionResult<&mut Function> {
        self.functions
            .get_mut(name)
            .ok_or_else(|| PartitionError::UnknownFunction(name.to_string()))
    }

    /// The entry function
    pub fn main(&self) -> PartitionResult<&Function> {
        self.get(ENTRY)
    }

    /// Insert or replace a function
    pub fn insert(&mut self, name: impl Into<String>, function: Function) {
        self.functions.insert(name.into(), function);
    }

    /// Names of functions extracted for `compiler`
    pub fn partitions_for<'a>(&'a self, compiler: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.functions
            .iter()
            .filter(move |(_, f)| f.attrs.compiler.as_deref() == Some(compiler))
            .map(|(name, _)| name.as_str())
    }

    /// Names of functions that are not extracted partitions
    pub fn host_functions(&self) -> Vec<String> {
        self.functions
            .iter()
            .filter(|(_, f)| !f.is_partition())
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::FunctionAttrs;

    #[test]
    fn test_from_main() {
        let module = IrModule::from_main(Function::new());
        assert!(module.main().is_ok());
        assert!(matches!(
            module.get("other"),
            Err(PartitionError::UnknownFunction(_))
        ));
    }

    #[test]
    fn test_partition_listing() {
        let mut module = IrModule::from_main(Function::new());
        let mut part = Function::new();
        part.attrs = FunctionAttrs {
            compiler: Some("rvx".to_string()),
            ..Default::default()
        };
        module.insert("default_rvx_main_0", part);

        let parts: Vec<_> = module.partitions_for("rvx").collect();
        assert_eq!(parts, vec!["default_rvx_main_0"]);
        assert_eq!(module.host_functions(), vec!["main".to_string()]);
    }
}

//! Variable bindings for a single script run

use crate::error::EvalError;
use crate::value::Value;
use std::collections::HashMap;

/// Mutable name-to-value table, owned by one evaluation run
///
/// There is no scoping: declaring a name that is already bound replaces the
/// previous value.
#[derive(Debug, Clone, Default)]
pub struct Context {
    variables: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, overwriting any earlier binding
    pub fn declare(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        tracing::trace!(%name, ty = %value.get_type(), "declare");
        self.variables.insert(name, value);
    }

    /// Look up a binding
    pub fn get(&self, name: &str) -> Result<&Value, EvalError> {
        self.variables
            .get(name)
            .ok_or_else(|| EvalError::UndefinedVariable(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

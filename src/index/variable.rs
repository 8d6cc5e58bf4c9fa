//! Variable records and the table that holds them.

use std::path::PathBuf;

use rustc_hash::FxHashMap;

/// Where a custom property was declared, which decides where it is visible.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Declared in a stylesheet; visible everywhere.
    Global,
    /// Declared with a `@cssprop` tag in a component; visible only where the
    /// named component is imported.
    Component(String),
}

/// A single CSS custom property known to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// Full property name including the leading `--`.
    pub name: String,
    pub description: Option<String>,
    /// Declared value (or `initial-value` of an `@property` rule).
    pub value: Option<String>,
    pub origin: Origin,
    /// Declaring file, relative to the workspace root.
    pub source_file: PathBuf,
}

impl Variable {
    pub fn component_name(&self) -> Option<&str> {
        match &self.origin {
            Origin::Global => None,
            Origin::Component(name) => Some(name),
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self.origin, Origin::Global)
    }
}

/// Name-keyed collection of variables. Inserting an existing name replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableTable {
    variables: FxHashMap<String, Variable>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `variable`, returning the record it replaced (last writer wins).
    pub fn insert(&mut self, variable: Variable) -> Option<Variable> {
        self.variables.insert(variable.name.clone(), variable)
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
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

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }
}

impl FromIterator<Variable> for VariableTable {
    fn from_iter<I: IntoIterator<Item = Variable>>(iter: I) -> Self {
        let mut table = VariableTable::new();
        for variable in iter {
            table.insert(variable);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(name: &str, description: &str, file: &str) -> Variable {
        Variable {
            name: name.to_string(),
            description: Some(description.to_string()),
            value: None,
            origin: Origin::Global,
            source_file: PathBuf::from(file),
        }
    }

    #[test]
    fn test_insert_last_writer_wins() {
        let mut table = VariableTable::new();
        assert!(table.insert(global("--brand", "first", "a.css")).is_none());
        let replaced = table.insert(global("--brand", "second", "b.css"));

        assert_eq!(replaced.unwrap().description.as_deref(), Some("first"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("--brand").unwrap().source_file, PathBuf::from("b.css"));
    }

    #[test]
    fn test_component_name_follows_origin() {
        let mut variable = global("--btn-size", "size", "Button.svelte");
        assert_eq!(variable.component_name(), None);
        assert!(variable.is_global());

        variable.origin = Origin::Component("Button".to_string());
        assert_eq!(variable.component_name(), Some("Button"));
        assert!(!variable.is_global());
    }
}

//! Accessor classification.
//!
//! Every type with relations is a Resource. Whether a type can also be the
//! subject of a relation is not derivable from the schema, so it is decided by
//! an explicit table: a set of type names plus a list of name suffixes.

use std::collections::BTreeSet;

use fluentfga_schema::{to_snake_case, TypeDefinition};

/// Suffixes classified as accessors by [`AccessorPolicy::default`].
pub const DEFAULT_ACCESSOR_SUFFIXES: &[&str] = &["user", "group", "team", "org", "organization"];

/// Decides which generated types implement the `Accessor` capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorPolicy {
    suffixes: Vec<String>,
    types: BTreeSet<String>,
}

impl Default for AccessorPolicy {
    fn default() -> Self {
        Self {
            suffixes: DEFAULT_ACCESSOR_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            types: BTreeSet::new(),
        }
    }
}

impl AccessorPolicy {
    /// A policy that classifies only relation-less types as accessors.
    pub fn empty() -> Self {
        Self {
            suffixes: Vec::new(),
            types: BTreeSet::new(),
        }
    }

    /// Adds a name suffix (matched against the canonical type name).
    pub fn with_suffix(mut self, suffix: &str) -> Self {
        let suffix = to_snake_case(suffix);
        if !suffix.is_empty() && !self.suffixes.contains(&suffix) {
            self.suffixes.push(suffix);
        }
        self
    }

    /// Adds an exact type name.
    pub fn with_type(mut self, type_name: &str) -> Self {
        self.types.insert(to_snake_case(type_name));
        self
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    /// Returns true if the type should implement `Accessor`.
    ///
    /// A type without relations is always an accessor: it can never be the
    /// object of a tuple, only its subject.
    pub fn is_accessor(&self, def: &TypeDefinition) -> bool {
        if !def.has_relations() {
            return true;
        }
        let name = to_snake_case(&def.name);
        self.types.contains(&name) || self.suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }
}

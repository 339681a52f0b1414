//! Core type definitions for the authorization schema.

use serde::{Deserialize, Serialize};

use crate::naming::to_snake_case;

/// Suffix marking a condition parameter bound when the tuple is written.
pub const INIT_SUFFIX: &str = "_init";

/// Suffix marking a condition parameter supplied when access is checked.
pub const PROVIDED_SUFFIX: &str = "_provided";

/// An authorization schema: type definitions and the conditions they may use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationModel {
    /// Schema version (e.g., "1.1").
    pub schema_version: String,
    /// Type definitions, in schema order.
    pub type_definitions: Vec<TypeDefinition>,
    /// Conditions, in schema order. Names are unique.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl AuthorizationModel {
    /// Creates an empty model with the given schema version.
    pub fn new(schema_version: impl Into<String>) -> Self {
        Self {
            schema_version: schema_version.into(),
            type_definitions: Vec::new(),
            conditions: Vec::new(),
        }
    }

    /// Looks up a type definition by name.
    pub fn type_definition(&self, name: &str) -> Option<&TypeDefinition> {
        self.type_definitions.iter().find(|t| t.name == name)
    }

    /// Looks up a condition by name.
    pub fn condition(&self, name: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.name == name)
    }
}

/// A type definition within the authorization schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// The type name (e.g., "form", "crm_company").
    pub name: String,
    /// Relations defined on this type, in schema order.
    pub relations: Vec<RelationDefinition>,
}

impl TypeDefinition {
    /// Creates a type definition with no relations.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relations: Vec::new(),
        }
    }

    /// Adds a relation, canonicalising its name.
    pub fn with_relation(mut self, name: &str, kind: RelationKind) -> Self {
        self.relations.push(RelationDefinition::new(name, kind));
        self
    }

    /// Looks up a relation. Comparison is done on the canonical form.
    pub fn relation(&self, name: &str) -> Option<&RelationDefinition> {
        let canonical = to_snake_case(name);
        self.relations.iter().find(|r| r.name == canonical)
    }

    pub fn has_relations(&self) -> bool {
        !self.relations.is_empty()
    }

    /// Relations that can be assigned by writing a tuple, in schema order.
    pub fn direct_relations(&self) -> impl Iterator<Item = &RelationDefinition> {
        self.relations
            .iter()
            .filter(|r| r.kind == RelationKind::Direct)
    }

    /// Relations derived by rule, in schema order.
    pub fn computed_relations(&self) -> impl Iterator<Item = &RelationDefinition> {
        self.relations
            .iter()
            .filter(|r| r.kind == RelationKind::Computed)
    }
}

/// A relation definition on a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDefinition {
    /// The canonical (lower snake case) relation name.
    pub name: String,
    /// Whether the relation is assigned directly or computed.
    pub kind: RelationKind,
}

impl RelationDefinition {
    pub fn new(name: &str, kind: RelationKind) -> Self {
        Self {
            name: to_snake_case(name),
            kind,
        }
    }
}

/// How a relation gets its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    /// Assigned by writing a tuple.
    Direct,
    /// Derived from other relations by a rewrite rule.
    Computed,
}

/// A named, parameterised predicate that may be attached to a tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// The condition name (e.g., "active_trial").
    pub name: String,
    /// The condition expression, when the schema carries it.
    #[serde(default)]
    pub expression: Option<String>,
    /// Parameters, in schema order.
    pub parameters: Vec<Parameter>,
}

impl Condition {
    /// Parameters bound when the tuple is written.
    pub fn init_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(|p| p.phase() == ParameterPhase::Init)
    }

    /// Parameters supplied when access is checked.
    pub fn provided_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(|p| p.phase() == ParameterPhase::Provided)
    }
}

/// A condition parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// The parameter name as declared, including its phase suffix.
    pub name: String,
    /// The parameter's value kind.
    pub kind: ParameterKind,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// The phase this parameter is bound in, decided by its name suffix.
    ///
    /// A name without a recognised suffix belongs to the `Init` phase.
    pub fn phase(&self) -> ParameterPhase {
        if self.name.ends_with(PROVIDED_SUFFIX) {
            ParameterPhase::Provided
        } else {
            ParameterPhase::Init
        }
    }

    /// The parameter name with its phase suffix removed.
    pub fn display_name(&self) -> &str {
        self.name
            .strip_suffix(PROVIDED_SUFFIX)
            .or_else(|| self.name.strip_suffix(INIT_SUFFIX))
            .filter(|stripped| !stripped.is_empty())
            .unwrap_or(self.name.as_str())
    }

    /// Whether the name carries one of the recognised phase suffixes.
    pub fn has_phase_suffix(&self) -> bool {
        self.name.ends_with(INIT_SUFFIX) || self.name.ends_with(PROVIDED_SUFFIX)
    }
}

/// When a condition parameter is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterPhase {
    /// Bound at grant time and stored with the tuple.
    Init,
    /// Supplied by the caller at check time.
    Provided,
}

/// The value kind of a condition parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterKind {
    String,
    Int,
    Bool,
    Timestamp,
    Duration,
}

/// Result of mapping a schema type name onto a [`ParameterKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindMapping {
    /// The type maps directly onto a kind.
    Exact(ParameterKind),
    /// The type is scalar but has no dedicated kind; it is treated as a string.
    Fallback,
    /// The type is a collection and cannot be modelled.
    Unsupported,
}

impl ParameterKind {
    /// Maps a schema type name onto a kind.
    ///
    /// Accepts both the OpenFGA form (`TYPE_NAME_TIMESTAMP`) and the short
    /// lowercase form (`timestamp`).
    pub fn from_type_name(type_name: &str) -> KindMapping {
        let short = type_name
            .strip_prefix("TYPE_NAME_")
            .unwrap_or(type_name)
            .to_ascii_lowercase();

        match short.as_str() {
            "string" => KindMapping::Exact(ParameterKind::String),
            "int" | "uint" => KindMapping::Exact(ParameterKind::Int),
            "bool" => KindMapping::Exact(ParameterKind::Bool),
            "timestamp" => KindMapping::Exact(ParameterKind::Timestamp),
            "duration" => KindMapping::Exact(ParameterKind::Duration),
            "list" | "map" => KindMapping::Unsupported,
            _ => KindMapping::Fallback,
        }
    }
}

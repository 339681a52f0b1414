//! Loader for the JSON form of an authorization model.
//!
//! Two shapes are accepted:
//! - The OpenFGA transform output: `relations` is a map of usersets, direct
//!   assignment is described by `metadata.relations[name].directly_related_user_types`,
//!   and condition parameters are a map of `{ "type_name": "TYPE_NAME_*" }`.
//! - A simplified shape: `relations` may be a list of `{ "name", "direct" }`
//!   entries and condition parameters a list of `{ "name", "type" }` entries.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, warn};

use super::types::{
    AuthorizationModel, Condition, KindMapping, Parameter, ParameterKind, RelationDefinition,
    RelationKind, TypeDefinition,
};
use crate::error::{SchemaError, SchemaResult};

/// Schema version assumed when the document does not declare one.
const DEFAULT_SCHEMA_VERSION: &str = "1.1";

impl AuthorizationModel {
    /// Parses a model from its JSON text.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        let value: Value = serde_json::from_str(json).map_err(|e| SchemaError::InvalidJson {
            message: e.to_string(),
        })?;
        Self::from_value(&value)
    }

    /// Builds a model from an already parsed JSON document.
    pub fn from_value(value: &Value) -> SchemaResult<Self> {
        let root = value
            .as_object()
            .ok_or_else(|| SchemaError::malformed("schema must be a JSON object"))?;

        let schema_version = root
            .get("schema_version")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_SCHEMA_VERSION);

        let type_defs = root
            .get("type_definitions")
            .and_then(Value::as_array)
            .ok_or_else(|| SchemaError::malformed("missing 'type_definitions' array"))?;

        let mut model = AuthorizationModel::new(schema_version);
        let mut seen = HashSet::new();

        for (index, type_def) in type_defs.iter().enumerate() {
            let def = parse_type_definition(index, type_def)?;
            if !seen.insert(def.name.clone()) {
                return Err(SchemaError::DuplicateType {
                    type_name: def.name,
                });
            }
            model.type_definitions.push(def);
        }

        if let Some(conditions) = root.get("conditions") {
            model.conditions = parse_conditions(conditions)?;
        }

        debug!(
            schema_version = %model.schema_version,
            types = model.type_definitions.len(),
            conditions = model.conditions.len(),
            "Loaded authorization schema"
        );

        Ok(model)
    }
}

fn parse_type_definition(index: usize, json: &Value) -> SchemaResult<TypeDefinition> {
    let type_name = json
        .get("type")
        .or_else(|| json.get("name"))
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            SchemaError::malformed(format!("type_definitions[{index}] has no type name"))
        })?;

    let mut def = TypeDefinition::new(type_name);
    let metadata = json
        .get("metadata")
        .and_then(|m| m.get("relations"))
        .and_then(Value::as_object);

    match json.get("relations") {
        None | Some(Value::Null) => {}
        Some(Value::Object(relations)) => {
            for (name, userset) in relations {
                let kind = relation_kind(userset, metadata.and_then(|m| m.get(name)));
                push_relation(&mut def, name, kind)?;
            }
        }
        Some(Value::Array(relations)) => {
            for (position, relation) in relations.iter().enumerate() {
                let name = relation
                    .get("name")
                    .and_then(Value::as_str)
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| {
                        SchemaError::malformed(format!(
                            "relation {position} of type '{type_name}' has no name"
                        ))
                    })?;
                let kind = relation_kind(relation, metadata.and_then(|m| m.get(name)));
                push_relation(&mut def, name, kind)?;
            }
        }
        Some(_) => {
            return Err(SchemaError::malformed(format!(
                "relations of type '{type_name}' must be an object or an array"
            )))
        }
    }

    Ok(def)
}

fn push_relation(def: &mut TypeDefinition, name: &str, kind: RelationKind) -> SchemaResult<()> {
    let relation = RelationDefinition::new(name, kind);
    if def.relations.iter().any(|r| r.name == relation.name) {
        return Err(SchemaError::DuplicateRelation {
            type_name: def.name.clone(),
            relation: relation.name,
        });
    }
    def.relations.push(relation);
    Ok(())
}

/// Decides whether a relation is directly assignable.
///
/// An explicit `direct` flag wins. Otherwise a relation is direct when the
/// metadata lists directly related user types or the userset includes `this`.
fn relation_kind(userset: &Value, metadata: Option<&Value>) -> RelationKind {
    if let Some(direct) = userset.get("direct").and_then(Value::as_bool) {
        return if direct {
            RelationKind::Direct
        } else {
            RelationKind::Computed
        };
    }

    let has_direct_types = metadata
        .and_then(|m| m.get("directly_related_user_types"))
        .and_then(Value::as_array)
        .is_some_and(|types| !types.is_empty());

    if has_direct_types || userset_contains_this(userset) {
        RelationKind::Direct
    } else {
        RelationKind::Computed
    }
}

fn userset_contains_this(userset: &Value) -> bool {
    if userset.get("this").is_some() {
        return true;
    }
    userset
        .get("union")
        .and_then(|u| u.get("child"))
        .and_then(Value::as_array)
        .is_some_and(|children| children.iter().any(userset_contains_this))
}

fn parse_conditions(json: &Value) -> SchemaResult<Vec<Condition>> {
    let entries: Vec<(String, &Value)> = match json {
        Value::Null => Vec::new(),
        Value::Object(map) => map
            .iter()
            .map(|(key, condition)| {
                let name = condition
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or(key)
                    .to_string();
                (name, condition)
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, condition)| {
                condition
                    .get("name")
                    .and_then(Value::as_str)
                    .map(|name| (name.to_string(), condition))
                    .ok_or_else(|| {
                        SchemaError::malformed(format!("conditions[{index}] has no name"))
                    })
            })
            .collect::<SchemaResult<_>>()?,
        _ => {
            return Err(SchemaError::malformed(
                "'conditions' must be an object or an array",
            ))
        }
    };

    let mut conditions: Vec<Condition> = Vec::with_capacity(entries.len());
    for (name, json) in entries {
        if name.is_empty() {
            return Err(SchemaError::malformed("condition name cannot be empty"));
        }
        if conditions.iter().any(|c| c.name == name) {
            return Err(SchemaError::DuplicateCondition { condition: name });
        }

        let parameters = parse_parameters(&name, json.get("parameters"))?;
        let expression = json
            .get("expression")
            .and_then(Value::as_str)
            .map(str::to_string);

        conditions.push(Condition {
            name,
            expression,
            parameters,
        });
    }

    Ok(conditions)
}

fn parse_parameters(condition: &str, json: Option<&Value>) -> SchemaResult<Vec<Parameter>> {
    match json {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(name, param)| {
                let type_name = param.get("type_name").or_else(|| param.get("type"));
                parse_parameter(condition, name, type_name)
            })
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|param| {
                let name = param
                    .get("name")
                    .and_then(Value::as_str)
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| {
                        SchemaError::malformed(format!(
                            "a parameter of condition '{condition}' has no name"
                        ))
                    })?;
                let type_name = param.get("type").or_else(|| param.get("type_name"));
                parse_parameter(condition, name, type_name)
            })
            .collect(),
        Some(_) => Err(SchemaError::malformed(format!(
            "parameters of condition '{condition}' must be an object or an array"
        ))),
    }
}

fn parse_parameter(
    condition: &str,
    name: &str,
    type_name: Option<&Value>,
) -> SchemaResult<Parameter> {
    let type_name = type_name.and_then(Value::as_str).ok_or_else(|| {
        SchemaError::malformed(format!("parameter {condition}.{name} has no type"))
    })?;

    let kind = match ParameterKind::from_type_name(type_name) {
        KindMapping::Exact(kind) => kind,
        KindMapping::Fallback => {
            warn!(
                condition,
                parameter = name,
                type_name,
                "No dedicated kind for parameter type; serializing as string"
            );
            ParameterKind::String
        }
        KindMapping::Unsupported => {
            return Err(SchemaError::UnsupportedParameterType {
                condition: condition.to_string(),
                parameter: name.to_string(),
                type_name: type_name.to_string(),
            })
        }
    };

    let parameter = Parameter::new(name, kind);
    if !parameter.has_phase_suffix() {
        debug!(
            condition,
            parameter = name,
            "Parameter has no phase suffix; binding it at grant time"
        );
    }
    Ok(parameter)
}

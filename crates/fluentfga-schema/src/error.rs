//! Schema error types.

use thiserror::Error;

/// Errors raised while loading an authorization schema or generating types from it.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema document is not valid JSON.
    #[error("invalid schema JSON: {message}")]
    InvalidJson { message: String },

    /// The schema document is JSON but does not have the expected shape.
    #[error("malformed schema: {message}")]
    Malformed { message: String },

    /// Two type definitions share a name.
    #[error("duplicate type definition: {type_name}")]
    DuplicateType { type_name: String },

    /// Two relations on one type share a canonical name.
    #[error("duplicate relation '{relation}' on type '{type_name}'")]
    DuplicateRelation { type_name: String, relation: String },

    /// Two conditions share a name.
    #[error("duplicate condition: {condition}")]
    DuplicateCondition { condition: String },

    /// A direct relation uses the name reserved for the computed-relation group.
    #[error("relation 'perform' on type '{type_name}' collides with the generated perform group")]
    ReservedRelation { type_name: String },

    /// A type name cannot be mapped to a Rust type name and back unchanged.
    #[error("type name '{type_name}' is not in canonical snake_case form")]
    NonCanonicalTypeName { type_name: String },

    /// A condition parameter has a type the generator cannot model.
    #[error("unsupported parameter type '{type_name}' for {condition}.{parameter}")]
    UnsupportedParameterType {
        condition: String,
        parameter: String,
        type_name: String,
    },
}

impl SchemaError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        SchemaError::Malformed {
            message: message.into(),
        }
    }
}

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

//! fluentfga-schema: Authorization schema model and naming rules
//!
//! This crate contains the pieces shared by the code generator and the
//! runtime client:
//! - The in-memory authorization schema (types, relations, conditions)
//! - A loader for the JSON form of an OpenFGA authorization model
//! - Entity naming: qualified `type:id` references and relation selectors
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              fluentfga-schema                │
//! ├─────────────────────────────────────────────┤
//! │  model/   - Schema types & JSON loader      │
//! │  naming   - Qualify & ResolveRelation       │
//! │  error    - Schema errors                   │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod model;
pub mod naming;

#[cfg(test)]
mod naming_proptest;

// Re-export commonly used types at the crate root
pub use error::{SchemaError, SchemaResult};
pub use model::{
    AuthorizationModel, Condition, Parameter, ParameterKind, ParameterPhase, RelationDefinition,
    RelationKind, TypeDefinition,
};
pub use naming::{qualify, resolve_relation, to_pascal_case, to_snake_case, Member};

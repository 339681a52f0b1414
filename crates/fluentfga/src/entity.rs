//! Capability traits implemented by generated entity types.
//!
//! Builders are generic over these capabilities instead of over arbitrary
//! types: `add::<A, R>` requires `A: Accessor` and `R: Resource`, so a
//! resource-only type cannot be granted access to anything.

use fluentfga_schema::{naming, resolve_relation, to_snake_case, Member};

/// A schema type.
pub trait Entity {
    /// The Rust-side type name, e.g. `CrmCompany`.
    const NAME: &'static str;

    /// The canonical schema type name, e.g. `crm_company`.
    fn type_name() -> String {
        to_snake_case(Self::NAME)
    }
}

/// A type that can be the object of a tuple.
pub trait Resource: Entity {}

/// A type that can be the subject (user) of a tuple.
pub trait Accessor: Entity {}

/// A static selector into a generated entity's relations.
pub trait RelationSelector {
    /// The member chain this selector designates.
    fn members(&self) -> &'static [Member];

    /// The canonical relation name; the innermost member of the chain.
    ///
    /// Empty when the chain does not end at a named member.
    fn resolve(&self) -> String {
        resolve_relation(self.members()).unwrap_or_default()
    }
}

/// Anything that names a relation on resource type `R`.
///
/// Generated selector enums implement this for their own resource only.
/// Plain strings are accepted for every resource and passed through as-is.
pub trait RelationName<R: Resource> {
    fn relation_name(&self) -> String;
}

impl<R: Resource> RelationName<R> for &str {
    fn relation_name(&self) -> String {
        (*self).to_string()
    }
}

impl<R: Resource> RelationName<R> for String {
    fn relation_name(&self) -> String {
        self.clone()
    }
}

impl<R: Resource> RelationName<R> for &String {
    fn relation_name(&self) -> String {
        (*self).clone()
    }
}

/// Qualified reference `type:id` for an entity of type `T`.
pub fn qualify<T: Entity>(id: &str) -> String {
    naming::qualify(T::NAME, Some(id))
}

/// The bare canonical type token for `T`, used by type-scoped queries.
pub fn type_token<T: Entity>() -> String {
    naming::qualify(T::NAME, None)
}

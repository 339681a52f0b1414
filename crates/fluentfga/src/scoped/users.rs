use std::marker::PhantomData;

use tokio_util::sync::CancellationToken;

use crate::entity::{Accessor, RelationName, Resource};
use crate::error::FgaResult;
use crate::permissions::Permissions;

/// Accessor-centred listings for `U`.
pub struct Users<U> {
    permissions: Permissions,
    _accessor: PhantomData<fn() -> U>,
}

impl<U: Accessor> Users<U> {
    pub fn new(permissions: Permissions) -> Self {
        Self {
            permissions,
            _accessor: PhantomData,
        }
    }

    /// Objects of type `R` the user has `relation` to.
    pub async fn list_objects<R: Resource>(
        &self,
        user_id: &str,
        relation: impl RelationName<R>,
        token: &CancellationToken,
    ) -> FgaResult<Vec<String>> {
        self.permissions
            .introspect()
            .list_objects_for_accessor::<R, U>(user_id, relation, token)
            .await
    }

    /// Objects of type `R` the user has any stored relation to.
    pub async fn list_all_objects<R: Resource>(
        &self,
        user_id: &str,
        token: &CancellationToken,
    ) -> FgaResult<Vec<String>> {
        self.permissions
            .introspect()
            .list_all_objects_for_accessor::<R, U>(user_id, token)
            .await
    }
}

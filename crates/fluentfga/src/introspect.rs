//! Read-only relationship queries.
//!
//! All results are qualified references (`form:224`, `user:alice`).

use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cancel::cancellable;
use crate::engine::{AuthorizationEngine, ReadFilter, TupleKey};
use crate::entity::{qualify, type_token, Accessor, RelationName, Resource};
use crate::error::FgaResult;

/// Stateless query handle. Each call is independent.
#[derive(Clone)]
pub struct Introspector {
    engine: Arc<dyn AuthorizationEngine>,
}

impl Introspector {
    pub fn new(engine: Arc<dyn AuthorizationEngine>) -> Self {
        Self { engine }
    }

    /// Objects of type `R` that `A:accessor_id` has `relation` to, directly
    /// or through computed relations.
    pub async fn list_objects_for_accessor<R: Resource, A: Accessor>(
        &self,
        accessor_id: &str,
        relation: impl RelationName<R>,
        token: &CancellationToken,
    ) -> FgaResult<Vec<String>> {
        let user = qualify::<A>(accessor_id);
        let relation = relation.relation_name();
        let object_type = type_token::<R>();
        debug!(%user, %relation, %object_type, "Listing objects for accessor");

        cancellable(
            token,
            self.engine.list_objects(&user, &relation, &object_type),
        )
        .await
    }

    /// Objects of type `R` with any stored tuple naming `A:accessor_id`.
    pub async fn list_all_objects_for_accessor<R: Resource, A: Accessor>(
        &self,
        accessor_id: &str,
        token: &CancellationToken,
    ) -> FgaResult<Vec<String>> {
        let filter = ReadFilter {
            user: Some(qualify::<A>(accessor_id)),
            object: Some(format!("{}:", type_token::<R>())),
        };
        debug!(user = ?filter.user, object = ?filter.object, "Listing all objects for accessor");

        let tuples = cancellable(token, self.engine.read(filter)).await?;
        Ok(distinct(tuples, |key| key.object))
    }

    /// Accessors of type `A` that have `relation` to `R:object_id`.
    pub async fn list_accessors_for_object<R: Resource, A: Accessor>(
        &self,
        object_id: &str,
        relation: impl RelationName<R>,
        token: &CancellationToken,
    ) -> FgaResult<Vec<String>> {
        let object = qualify::<R>(object_id);
        let relation = relation.relation_name();
        let user_type = type_token::<A>();
        debug!(%object, %relation, %user_type, "Listing accessors for object");

        cancellable(token, self.engine.list_users(&object, &relation, &user_type)).await
    }

    /// Every user with any stored tuple on `R:object_id`, of any type.
    pub async fn list_all_accessors_for_object<R: Resource>(
        &self,
        object_id: &str,
        token: &CancellationToken,
    ) -> FgaResult<Vec<String>> {
        let filter = ReadFilter {
            user: None,
            object: Some(qualify::<R>(object_id)),
        };
        debug!(object = ?filter.object, "Listing all accessors for object");

        let tuples = cancellable(token, self.engine.read(filter)).await?;
        Ok(distinct(tuples, |key| key.user))
    }
}

/// Projects each tuple and drops repeats, keeping first-seen order.
fn distinct(tuples: Vec<TupleKey>, project: impl Fn(TupleKey) -> String) -> Vec<String> {
    let mut seen = HashSet::new();
    tuples
        .into_iter()
        .map(project)
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

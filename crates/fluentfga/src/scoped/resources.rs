use tokio_util::sync::CancellationToken;

use crate::entity::{Accessor, RelationName, Resource};
use crate::error::FgaResult;
use crate::mutation::CommitOutcome;
use crate::permissions::Permissions;

/// Resource-centred helpers.
pub struct Resources {
    permissions: Permissions,
}

impl Resources {
    pub fn new(permissions: Permissions) -> Self {
        Self { permissions }
    }

    /// Grants `relation` on `R:resource_id` to each `A` accessor in one commit.
    pub async fn add_users<R, A, I>(
        &self,
        resource_id: &str,
        relation: impl RelationName<R>,
        user_ids: I,
        token: &CancellationToken,
    ) -> FgaResult<CommitOutcome>
    where
        R: Resource,
        A: Accessor,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut builder = self.permissions.mutate();
        builder.add_many::<A, R, _>(relation, resource_id, user_ids);
        builder.commit(token).await
    }

    /// Every user holding any stored relation on `R:resource_id`.
    pub async fn list_users<R: Resource>(
        &self,
        resource_id: &str,
        token: &CancellationToken,
    ) -> FgaResult<Vec<String>> {
        self.permissions
            .introspect()
            .list_all_accessors_for_object::<R>(resource_id, token)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::MockEngine;
    use crate::engine::TupleKey;
    use crate::entity::fixtures::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_add_users_and_list() {
        let engine = Arc::new(MockEngine::default());
        let resources = Permissions::new(engine.clone()).resources();

        let outcome = resources
            .add_users::<Form, User, _>(
                "223",
                FormRelation::Editor,
                ["carol", "dave", "eve"],
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(outcome.written.len(), 3);

        engine.store(TupleKey::new("form:223", "editor", "user:carol"));
        engine.store(TupleKey::new("form:223", "reader", "group:sales#member"));
        let users = resources
            .list_users::<Form>("223", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(users, vec!["user:carol", "group:sales#member"]);
    }
}

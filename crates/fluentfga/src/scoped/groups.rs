use std::marker::PhantomData;

use tokio_util::sync::CancellationToken;

use crate::entity::{Accessor, Resource};
use crate::error::FgaResult;
use crate::mutation::CommitOutcome;
use crate::permissions::Permissions;

/// Relation linking a group to its members.
pub const MEMBER_RELATION: &str = "member";

/// Membership of `U` accessors in `G` groups.
pub struct Groups<G, U> {
    permissions: Permissions,
    _types: PhantomData<fn() -> (G, U)>,
}

impl<G: Resource, U: Accessor> Groups<G, U> {
    pub fn new(permissions: Permissions) -> Self {
        Self {
            permissions,
            _types: PhantomData,
        }
    }

    /// Adds every user to the group in one commit.
    ///
    /// An empty `user_ids` fails like an empty commit.
    pub async fn add_members<I>(
        &self,
        group_id: &str,
        user_ids: I,
        token: &CancellationToken,
    ) -> FgaResult<CommitOutcome>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut builder = self.permissions.mutate();
        builder.add_many::<U, G, _>(MEMBER_RELATION, group_id, user_ids);
        builder.commit(token).await
    }

    /// Members of the group of type `U`, including indirect ones.
    pub async fn list_members(
        &self,
        group_id: &str,
        token: &CancellationToken,
    ) -> FgaResult<Vec<String>> {
        self.permissions
            .introspect()
            .list_accessors_for_object::<G, U>(group_id, MEMBER_RELATION, token)
            .await
    }
}

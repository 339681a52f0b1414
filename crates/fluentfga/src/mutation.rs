//! Accumulate grants and revocations, then commit them in one request.
//!
//! ```ignore
//! let outcome = permissions
//!     .mutate()
//!     .add::<User, Form>("alice", FormRelation::Editor, "224")
//!     .add_also::<Document>(DocumentRelation::Reader, "7")?
//!     .revoke::<User, Form>("bob", "editor", "224")
//!     .commit(&token)
//!     .await?;
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cancel::cancellable;
use crate::condition::ConditionInstance;
use crate::engine::{AuthorizationEngine, TupleKey, WriteRequest};
use crate::entity::{qualify, Accessor, RelationName, Resource};
use crate::error::{FgaError, FgaResult};

/// Tuples actually written and deleted by a commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitOutcome {
    pub written: Vec<TupleKey>,
    pub deleted: Vec<TupleKey>,
}

/// Builder for tuple writes and deletes.
///
/// Not meant to be shared between tasks: create one per unit of work.
pub struct MutationBuilder {
    engine: Arc<dyn AuthorizationEngine>,
    transactional: bool,
    writes: Vec<TupleKey>,
    deletes: Vec<TupleKey>,
    /// Qualified user of the last `add`/`assign`, for `*_also` calls.
    last_accessor: Option<String>,
}

impl MutationBuilder {
    pub fn new(engine: Arc<dyn AuthorizationEngine>) -> Self {
        Self {
            engine,
            transactional: true,
            writes: Vec::new(),
            deletes: Vec::new(),
            last_accessor: None,
        }
    }

    /// Sends each tuple separately instead of as one atomic request, so the
    /// same tuple may be added and revoked in one commit.
    pub fn without_transactions(mut self) -> Self {
        self.transactional = false;
        self
    }

    pub fn is_transactional(&self) -> bool {
        self.transactional
    }

    /// Pending writes, in the order they were added.
    pub fn pending_writes(&self) -> &[TupleKey] {
        &self.writes
    }

    /// Pending deletes, in the order they were added.
    pub fn pending_deletes(&self) -> &[TupleKey] {
        &self.deletes
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.deletes.is_empty()
    }

    /// Grants `relation` on `R:resource_id` to `A:accessor_id`.
    pub fn add<A: Accessor, R: Resource>(
        &mut self,
        accessor_id: &str,
        relation: impl RelationName<R>,
        resource_id: &str,
    ) -> &mut Self {
        self.push_write::<R>(qualify::<A>(accessor_id), relation, resource_id, None)
    }

    /// Like [`add`](Self::add), with a condition attached to the tuple.
    pub fn add_conditional<A: Accessor, R: Resource>(
        &mut self,
        accessor_id: &str,
        relation: impl RelationName<R>,
        resource_id: &str,
        condition: ConditionInstance,
    ) -> &mut Self {
        self.push_write::<R>(
            qualify::<A>(accessor_id),
            relation,
            resource_id,
            Some(condition),
        )
    }

    /// Grants another relation to the accessor of the previous `add`.
    pub fn add_also<R: Resource>(
        &mut self,
        relation: impl RelationName<R>,
        resource_id: &str,
    ) -> FgaResult<&mut Self> {
        let user = self.remembered("add_also")?;
        Ok(self.push_write::<R>(user, relation, resource_id, None))
    }

    pub fn add_also_conditional<R: Resource>(
        &mut self,
        relation: impl RelationName<R>,
        resource_id: &str,
        condition: ConditionInstance,
    ) -> FgaResult<&mut Self> {
        let user = self.remembered("add_also_conditional")?;
        Ok(self.push_write::<R>(user, relation, resource_id, Some(condition)))
    }

    /// One grant per accessor id, all on the same relation and resource.
    pub fn add_many<A, R, I>(
        &mut self,
        relation: impl RelationName<R>,
        resource_id: &str,
        accessor_ids: I,
    ) -> &mut Self
    where
        A: Accessor,
        R: Resource,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let relation = relation.relation_name();
        for id in accessor_ids {
            self.add::<A, R>(id.as_ref(), relation.as_str(), resource_id);
        }
        self
    }

    /// Revokes `relation` on `R:resource_id` from `A:accessor_id`.
    pub fn revoke<A: Accessor, R: Resource>(
        &mut self,
        accessor_id: &str,
        relation: impl RelationName<R>,
        resource_id: &str,
    ) -> &mut Self {
        self.deletes.push(TupleKey::new(
            qualify::<R>(resource_id),
            relation.relation_name(),
            qualify::<A>(accessor_id),
        ));
        self
    }

    pub fn revoke_many<A, R, I>(
        &mut self,
        relation: impl RelationName<R>,
        resource_id: &str,
        accessor_ids: I,
    ) -> &mut Self
    where
        A: Accessor,
        R: Resource,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let relation = relation.relation_name();
        for id in accessor_ids {
            self.revoke::<A, R>(id.as_ref(), relation.as_str(), resource_id);
        }
        self
    }

    /// Relates one resource to another, e.g. a company as `parent` of a
    /// person. The grouping side is the tuple's user.
    pub fn assign<G: Resource, T: Resource>(
        &mut self,
        grouping_id: &str,
        relation: impl RelationName<T>,
        target_id: &str,
    ) -> &mut Self {
        self.push_write::<T>(qualify::<G>(grouping_id), relation, target_id, None)
    }

    pub fn assign_conditional<G: Resource, T: Resource>(
        &mut self,
        grouping_id: &str,
        relation: impl RelationName<T>,
        target_id: &str,
        condition: ConditionInstance,
    ) -> &mut Self {
        self.push_write::<T>(
            qualify::<G>(grouping_id),
            relation,
            target_id,
            Some(condition),
        )
    }

    /// Assigns the grouping of the previous `assign` to another target.
    pub fn assign_also<T: Resource>(
        &mut self,
        relation: impl RelationName<T>,
        target_id: &str,
    ) -> FgaResult<&mut Self> {
        let user = self.remembered("assign_also")?;
        Ok(self.push_write::<T>(user, relation, target_id, None))
    }

    /// Sends all pending writes and deletes.
    ///
    /// On success the builder is reset. On failure or cancellation nothing
    /// is cleared, so the same commit can be retried.
    pub async fn commit(&mut self, token: &CancellationToken) -> FgaResult<CommitOutcome> {
        if self.is_empty() {
            return Err(FgaError::sequence(
                "commit requires at least one pending write or delete",
            ));
        }

        let request = WriteRequest {
            writes: self.writes.clone(),
            deletes: self.deletes.clone(),
            transactional: self.transactional,
        };
        debug!(
            writes = request.writes.len(),
            deletes = request.deletes.len(),
            transactional = self.transactional,
            "Committing mutations"
        );

        let response = cancellable(token, self.engine.write(request)).await?;

        self.writes.clear();
        self.deletes.clear();
        self.last_accessor = None;
        info!(
            written = response.written.len(),
            deleted = response.deleted.len(),
            "Committed mutations"
        );

        Ok(CommitOutcome {
            written: response.written,
            deleted: response.deleted,
        })
    }

    fn push_write<R: Resource>(
        &mut self,
        user: String,
        relation: impl RelationName<R>,
        resource_id: &str,
        condition: Option<ConditionInstance>,
    ) -> &mut Self {
        let key = TupleKey::new(qualify::<R>(resource_id), relation.relation_name(), &user)
            .with_condition(condition);
        self.writes.push(key);
        self.last_accessor = Some(user);
        self
    }

    fn remembered(&self, operation: &str) -> FgaResult<String> {
        self.last_accessor.clone().ok_or_else(|| {
            FgaError::sequence(format!(
                "{operation} requires a previous add or assign on this builder"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{self, ConditionContext};
    use crate::engine::mock::MockEngine;
    use crate::entity::fixtures::*;
    use std::time::Duration;

    fn builder() -> (Arc<MockEngine>, MutationBuilder) {
        let engine = Arc::new(MockEngine::default());
        let builder = MutationBuilder::new(engine.clone());
        (engine, builder)
    }

    #[test]
    fn test_add_resolves_typed_and_string_relations() {
        let (_, mut builder) = builder();
        builder
            .add::<User, Form>("alice", FormRelation::Editor, "224")
            .add::<User, Form>("bob", FormRelation::Perform(FormPerformRelation::Edit), "224")
            .add::<Group, CrmCompany>("sales", "reader", "acme");

        assert_eq!(
            builder.pending_writes(),
            &[
                TupleKey::new("form:224", "editor", "user:alice"),
                TupleKey::new("form:224", "edit", "user:bob"),
                TupleKey::new("crm_company:acme", "reader", "group:sales"),
            ]
        );
    }

    #[test]
    fn test_also_without_accessor_is_sequence_error() {
        let (_, mut builder) = builder();
        let err = builder
            .add_also::<Form>(FormRelation::Editor, "1")
            .err()
            .unwrap();
        assert!(err.is_operation_sequence());

        let err = builder.assign_also::<Form>("parent", "1").err().unwrap();
        assert!(err.is_operation_sequence());

        builder.revoke::<User, Form>("alice", "editor", "1");
        assert!(builder.add_also::<Form>("editor", "2").is_err());
    }

    #[test]
    fn test_add_also_reuses_last_accessor() {
        let (_, mut builder) = builder();
        builder
            .add::<User, Form>("alice", FormRelation::Editor, "1")
            .add_also::<CrmCompany>("reader", "acme")
            .unwrap()
            .add_also::<Form>("approver", "2")
            .unwrap();

        let users: Vec<_> = builder.pending_writes().iter().map(|k| k.user.as_str()).collect();
        assert_eq!(users, vec!["user:alice"; 3]);
        assert_eq!(builder.pending_writes()[1].object, "crm_company:acme");
    }

    #[test]
    fn test_assign_remembers_grouping() {
        let (_, mut builder) = builder();
        builder
            .assign::<CrmCompany, Group>("acme", "parent", "sales")
            .assign_also::<Form>("owner", "9")
            .unwrap();

        assert_eq!(
            builder.pending_writes(),
            &[
                TupleKey::new("group:sales", "parent", "crm_company:acme"),
                TupleKey::new("form:9", "owner", "crm_company:acme"),
            ]
        );
    }

    #[test]
    fn test_add_many_expands_per_accessor() {
        let (_, mut builder) = builder();
        builder.add_many::<User, Form, _>(FormRelation::Editor, "223", ["carol", "dave", "eve"]);

        let writes = builder.pending_writes();
        assert_eq!(writes.len(), 3);
        assert!(writes.iter().all(|k| k.object == "form:223" && k.relation == "editor"));
        let users: Vec<_> = writes.iter().map(|k| k.user.as_str()).collect();
        assert_eq!(users, vec!["user:carol", "user:dave", "user:eve"]);
    }

    #[test]
    fn test_conditions_attach_to_writes_only() {
        let (_, mut builder) = builder();
        let mut context = ConditionContext::new();
        context.insert("trial_duration_init", condition::duration(Duration::from_secs(60)));
        builder
            .add_conditional::<Group, Form>(
                "acme",
                "editor",
                "1",
                ConditionInstance::new("active_trial", context),
            )
            .revoke::<Group, Form>("acme", "editor", "1");

        assert_eq!(
            builder.pending_writes()[0]
                .condition
                .as_ref()
                .map(|c| c.name.as_str()),
            Some("active_trial")
        );
        assert!(builder.pending_deletes()[0].condition.is_none());
    }

    #[tokio::test]
    async fn test_empty_commit_is_rejected() {
        let (engine, mut builder) = builder();
        let err = builder.commit(&CancellationToken::new()).await.unwrap_err();
        assert!(err.is_operation_sequence());
        assert!(engine.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_sends_one_request_and_resets() {
        let (engine, mut builder) = builder();
        builder
            .add::<User, Form>("alice", "editor", "1")
            .revoke::<User, Form>("bob", "editor", "1");

        let outcome = builder.commit(&CancellationToken::new()).await.unwrap();

        assert_eq!(outcome.written, vec![TupleKey::new("form:1", "editor", "user:alice")]);
        assert_eq!(outcome.deleted, vec![TupleKey::new("form:1", "editor", "user:bob")]);
        let writes = engine.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert!(writes[0].transactional);
        drop(writes);

        assert!(builder.is_empty());
        assert!(builder.add_also::<Form>("reader", "1").is_err());
    }

    #[tokio::test]
    async fn test_deletes_only_commit_returns_empty_written() {
        let (_, mut builder) = builder();
        builder.revoke_many::<User, Form, _>("editor", "5", vec!["a".to_string(), "b".to_string()]);

        let outcome = builder.commit(&CancellationToken::new()).await.unwrap();
        assert!(outcome.written.is_empty());
        assert_eq!(outcome.deleted.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_pending_operations() {
        let (engine, mut builder) = builder();
        engine.fail_requests(true);
        builder.add::<User, Form>("alice", "editor", "1");

        let err = builder.commit(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, FgaError::Engine(_)));
        assert_eq!(builder.pending_writes().len(), 1);
        assert!(builder.add_also::<Form>("reader", "2").is_ok());

        engine.fail_requests(false);
        let outcome = builder.commit(&CancellationToken::new()).await.unwrap();
        assert_eq!(outcome.written.len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_commit_keeps_state_and_sends_nothing() {
        let (engine, mut builder) = builder();
        builder.add::<User, Form>("alice", "editor", "1");
        let token = CancellationToken::new();
        token.cancel();

        let err = builder.commit(&token).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(builder.pending_writes().len(), 1);
        assert!(engine.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_without_transactions_flags_request() {
        let engine = Arc::new(MockEngine::default());
        let mut builder = MutationBuilder::new(engine.clone()).without_transactions();
        builder
            .add::<User, Form>("alice", "editor", "1")
            .revoke::<User, Form>("alice", "editor", "1");
        builder.commit(&CancellationToken::new()).await.unwrap();

        assert!(!engine.writes.lock().unwrap()[0].transactional);
    }
}

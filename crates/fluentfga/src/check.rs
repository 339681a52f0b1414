//! Accumulate access checks and evaluate them together.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cancel::cancellable;
use crate::condition::ConditionContext;
use crate::engine::{AuthorizationEngine, CheckItem, TupleKey};
use crate::entity::{qualify, Accessor, RelationName, Resource};
use crate::error::{EngineError, FgaError, FgaResult};

/// Result of one check in a [`CheckBuilder::validate`] batch.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub allowed: bool,
    pub tuple: TupleKey,
}

/// Builder for access checks.
///
/// `can` and `has` are interchangeable; pick whichever reads better.
pub struct CheckBuilder {
    engine: Arc<dyn AuthorizationEngine>,
    checks: Vec<CheckItem>,
    last_accessor: Option<String>,
}

impl CheckBuilder {
    pub fn new(engine: Arc<dyn AuthorizationEngine>) -> Self {
        Self {
            engine,
            checks: Vec::new(),
            last_accessor: None,
        }
    }

    /// Pending checks, in the order they were added.
    pub fn pending(&self) -> &[CheckItem] {
        &self.checks
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Asks whether `A:accessor_id` has `relation` on `R:resource_id`.
    pub fn can<A: Accessor, R: Resource>(
        &mut self,
        accessor_id: &str,
        relation: impl RelationName<R>,
        resource_id: &str,
    ) -> &mut Self {
        self.push::<R>(qualify::<A>(accessor_id), relation, resource_id, None)
    }

    /// Like [`can`](Self::can), with check-time condition parameters.
    pub fn can_with_context<A: Accessor, R: Resource>(
        &mut self,
        accessor_id: &str,
        relation: impl RelationName<R>,
        resource_id: &str,
        context: ConditionContext,
    ) -> &mut Self {
        self.push::<R>(
            qualify::<A>(accessor_id),
            relation,
            resource_id,
            Some(context),
        )
    }

    pub fn has<A: Accessor, R: Resource>(
        &mut self,
        accessor_id: &str,
        relation: impl RelationName<R>,
        resource_id: &str,
    ) -> &mut Self {
        self.can::<A, R>(accessor_id, relation, resource_id)
    }

    pub fn has_with_context<A: Accessor, R: Resource>(
        &mut self,
        accessor_id: &str,
        relation: impl RelationName<R>,
        resource_id: &str,
        context: ConditionContext,
    ) -> &mut Self {
        self.can_with_context::<A, R>(accessor_id, relation, resource_id, context)
    }

    /// Checks another relation for the accessor of the previous `can`.
    pub fn can_also<R: Resource>(
        &mut self,
        relation: impl RelationName<R>,
        resource_id: &str,
    ) -> FgaResult<&mut Self> {
        let user = self.remembered("can_also")?;
        Ok(self.push::<R>(user, relation, resource_id, None))
    }

    pub fn can_also_with_context<R: Resource>(
        &mut self,
        relation: impl RelationName<R>,
        resource_id: &str,
        context: ConditionContext,
    ) -> FgaResult<&mut Self> {
        let user = self.remembered("can_also_with_context")?;
        Ok(self.push::<R>(user, relation, resource_id, Some(context)))
    }

    pub fn has_also<R: Resource>(
        &mut self,
        relation: impl RelationName<R>,
        resource_id: &str,
    ) -> FgaResult<&mut Self> {
        let user = self.remembered("has_also")?;
        Ok(self.push::<R>(user, relation, resource_id, None))
    }

    pub fn has_also_with_context<R: Resource>(
        &mut self,
        relation: impl RelationName<R>,
        resource_id: &str,
        context: ConditionContext,
    ) -> FgaResult<&mut Self> {
        let user = self.remembered("has_also_with_context")?;
        Ok(self.push::<R>(user, relation, resource_id, Some(context)))
    }

    /// Evaluates only the first pending check.
    ///
    /// Later checks are discarded unevaluated. Returns `false` without a
    /// request when nothing is pending.
    pub async fn validate_single(&mut self, token: &CancellationToken) -> FgaResult<bool> {
        let Some(first) = self.checks.first().cloned() else {
            return Ok(false);
        };
        debug!(pending = self.checks.len(), "Validating first check");

        let allowed = cancellable(token, self.engine.check(first)).await?;
        self.reset();
        Ok(allowed)
    }

    /// Evaluates every pending check in one batch, in the order added.
    pub async fn validate(&mut self, token: &CancellationToken) -> FgaResult<Vec<CheckOutcome>> {
        if self.checks.is_empty() {
            self.reset();
            return Ok(Vec::new());
        }
        debug!(checks = self.checks.len(), "Validating batch");

        let allowed = cancellable(token, self.engine.batch_check(self.checks.clone())).await?;
        if allowed.len() != self.checks.len() {
            return Err(FgaError::Engine(EngineError::Decode {
                message: format!(
                    "expected {} batch results, got {}",
                    self.checks.len(),
                    allowed.len()
                ),
            }));
        }

        let outcomes = self
            .checks
            .iter()
            .zip(allowed)
            .map(|(item, allowed)| CheckOutcome {
                allowed,
                tuple: item.tuple_key(),
            })
            .collect();
        self.reset();
        Ok(outcomes)
    }

    /// True when every pending check is allowed. Vacuously true.
    pub async fn validate_all(&mut self, token: &CancellationToken) -> FgaResult<bool> {
        let outcomes = self.validate(token).await?;
        Ok(outcomes.iter().all(|outcome| outcome.allowed))
    }

    /// True when any pending check is allowed. Vacuously false.
    pub async fn validate_any(&mut self, token: &CancellationToken) -> FgaResult<bool> {
        let outcomes = self.validate(token).await?;
        Ok(outcomes.iter().any(|outcome| outcome.allowed))
    }

    fn push<R: Resource>(
        &mut self,
        user: String,
        relation: impl RelationName<R>,
        resource_id: &str,
        context: Option<ConditionContext>,
    ) -> &mut Self {
        let item = CheckItem::new(qualify::<R>(resource_id), relation.relation_name(), &user)
            .with_context(context);
        self.checks.push(item);
        self.last_accessor = Some(user);
        self
    }

    fn remembered(&self, operation: &str) -> FgaResult<String> {
        self.last_accessor.clone().ok_or_else(|| {
            FgaError::sequence(format!(
                "{operation} requires a previous can or has on this builder"
            ))
        })
    }

    fn reset(&mut self) {
        self.checks.clear();
        self.last_accessor = None;
    }
}

//! The authorization engine seam.
//!
//! Builders talk to the engine only through [`AuthorizationEngine`]. The
//! production implementation is [`HttpEngine`]; tests substitute recording
//! or scripted engines.

mod http;
#[cfg(test)]
pub(crate) mod mock;
mod wire;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::condition::{ConditionContext, ConditionInstance};
use crate::error::EngineResult;

pub use http::{HttpEngine, MAX_BATCH_SIZE};

/// A relationship tuple: `user` has `relation` to `object`.
///
/// `object` and `user` are always type-qualified (`form:224`, `user:alice`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleKey {
    pub user: String,
    pub relation: String,
    pub object: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionInstance>,
}

impl TupleKey {
    pub fn new(
        object: impl Into<String>,
        relation: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            relation: relation.into(),
            object: object.into(),
            condition: None,
        }
    }

    pub fn with_condition(mut self, condition: Option<ConditionInstance>) -> Self {
        self.condition = condition;
        self
    }

    /// Whether both tuples name the same relationship, ignoring conditions.
    pub fn same_relationship(&self, other: &TupleKey) -> bool {
        self.object == other.object && self.relation == other.relation && self.user == other.user
    }
}

impl fmt::Display for TupleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.object, self.relation, self.user)?;
        if let Some(condition) = &self.condition {
            write!(f, " [{}]", condition.name)?;
        }
        Ok(())
    }
}

/// One access check.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckItem {
    pub object: String,
    pub relation: String,
    pub user: String,
    /// Check-time condition parameters.
    pub context: Option<ConditionContext>,
}

impl CheckItem {
    pub fn new(
        object: impl Into<String>,
        relation: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            object: object.into(),
            relation: relation.into(),
            user: user.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: Option<ConditionContext>) -> Self {
        self.context = context;
        self
    }

    /// The tuple this check asks about.
    pub fn tuple_key(&self) -> TupleKey {
        TupleKey::new(&self.object, &self.relation, &self.user)
    }
}

/// A combined write and delete request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteRequest {
    pub writes: Vec<TupleKey>,
    pub deletes: Vec<TupleKey>,
    /// Apply all changes atomically. When false each tuple is applied on
    /// its own, writes before deletes.
    pub transactional: bool,
}

impl WriteRequest {
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.deletes.is_empty()
    }
}

/// Tuples actually written and deleted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteResponse {
    pub written: Vec<TupleKey>,
    pub deleted: Vec<TupleKey>,
}

/// Filter for an unrestricted tuple read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadFilter {
    /// Qualified user reference.
    pub user: Option<String>,
    /// Qualified object reference, or a bare `type:` prefix.
    pub object: Option<String>,
}

/// Abstract interface to an authorization engine.
///
/// Implementations must be stateless with respect to builder accumulation so
/// a single engine can be shared by any number of builders.
#[async_trait]
pub trait AuthorizationEngine: Send + Sync + 'static {
    /// Writes and deletes tuples.
    async fn write(&self, request: WriteRequest) -> EngineResult<WriteResponse>;

    /// Checks one tuple.
    async fn check(&self, item: CheckItem) -> EngineResult<bool>;

    /// Checks many tuples. Results are in request order.
    async fn batch_check(&self, items: Vec<CheckItem>) -> EngineResult<Vec<bool>>;

    /// Objects of `object_type` that `user` has `relation` to.
    async fn list_objects(
        &self,
        user: &str,
        relation: &str,
        object_type: &str,
    ) -> EngineResult<Vec<String>>;

    /// Stored tuples matching the filter, following pagination to the end.
    async fn read(&self, filter: ReadFilter) -> EngineResult<Vec<TupleKey>>;

    /// Users of `user_type` that have `relation` to `object`.
    async fn list_users(
        &self,
        object: &str,
        relation: &str,
        user_type: &str,
    ) -> EngineResult<Vec<String>>;
}

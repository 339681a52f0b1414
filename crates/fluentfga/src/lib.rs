//! Typed relationship-based access control for OpenFGA.
//!
//! Entity types generated by `fluentfga-codegen` implement the capability
//! traits in this crate ([`Entity`], [`Resource`], [`Accessor`],
//! [`RelationName`]). The builders are generic over those capabilities, so a
//! grant or check that makes no sense for the schema does not compile:
//!
//! ```ignore
//! let permissions = Permissions::connect(&FgaConfig::from_env()?);
//! let token = CancellationToken::new();
//!
//! permissions
//!     .mutate()
//!     .add::<User, Form>("alice", FormRelation::Editor, "224")
//!     .commit(&token)
//!     .await?;
//!
//! let allowed = permissions
//!     .validate()
//!     .can::<User, Form>("alice", FormRelation::Perform(FormPerformRelation::Edit), "224")
//!     .validate_single(&token)
//!     .await?;
//! ```
//!
//! Every engine call takes a [`CancellationToken`]; a cancelled call returns
//! [`FgaError::Cancelled`] and leaves builder state as it was.

mod cancel;
mod check;
pub mod condition;
pub mod config;
mod engine;
mod entity;
mod error;
mod introspect;
mod mutation;
mod permissions;
pub mod scoped;

pub use check::{CheckBuilder, CheckOutcome};
pub use condition::{ConditionContext, ConditionInstance};
pub use config::{ConfigLoadError, EngineSettings, FgaConfig, MutationSettings};
pub use engine::{
    AuthorizationEngine, CheckItem, HttpEngine, ReadFilter, TupleKey, WriteRequest,
    WriteResponse, MAX_BATCH_SIZE,
};
pub use entity::{qualify, type_token, Accessor, Entity, RelationName, RelationSelector, Resource};
pub use error::{EngineError, EngineResult, FgaError, FgaResult};
pub use introspect::Introspector;
pub use mutation::{CommitOutcome, MutationBuilder};
pub use permissions::Permissions;
pub use scoped::{Groups, Resources, Users};

pub use fluentfga_schema::{resolve_relation, Member};

// Generated condition builders name timestamp types through this path.
pub use chrono;
pub use tokio_util::sync::CancellationToken;

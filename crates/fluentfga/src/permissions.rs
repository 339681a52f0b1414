//! Entry point handing out builders that share one engine.

use std::sync::Arc;

use crate::check::CheckBuilder;
use crate::config::FgaConfig;
use crate::engine::{AuthorizationEngine, HttpEngine};
use crate::entity::{Accessor, Resource};
use crate::introspect::Introspector;
use crate::mutation::MutationBuilder;
use crate::scoped::{Groups, Resources, Users};

/// Shared handle to an authorization engine.
///
/// Construct once at startup and pass it by reference or clone it; every
/// builder it creates is independent.
#[derive(Clone)]
pub struct Permissions {
    engine: Arc<dyn AuthorizationEngine>,
    transactional: bool,
}

impl Permissions {
    pub fn new(engine: Arc<dyn AuthorizationEngine>) -> Self {
        Self {
            engine,
            transactional: true,
        }
    }

    /// Applies the `mutation` section of `config` to builders created here.
    pub fn with_config(engine: Arc<dyn AuthorizationEngine>, config: &FgaConfig) -> Self {
        Self {
            engine,
            transactional: !config.mutation.disable_transactions,
        }
    }

    /// Connects an [`HttpEngine`] described by `config`.
    pub fn connect(config: &FgaConfig) -> Self {
        Self::with_config(Arc::new(HttpEngine::from_config(&config.engine)), config)
    }

    /// Mutation builders created from the returned handle commit each tuple
    /// on its own.
    pub fn without_transactions(mut self) -> Self {
        self.transactional = false;
        self
    }

    pub fn engine(&self) -> &Arc<dyn AuthorizationEngine> {
        &self.engine
    }

    pub fn mutate(&self) -> MutationBuilder {
        let builder = MutationBuilder::new(self.engine.clone());
        if self.transactional {
            builder
        } else {
            builder.without_transactions()
        }
    }

    pub fn validate(&self) -> CheckBuilder {
        CheckBuilder::new(self.engine.clone())
    }

    pub fn introspect(&self) -> Introspector {
        Introspector::new(self.engine.clone())
    }

    /// Group membership helpers for groups of `G` holding members of `U`.
    pub fn groups<G: Resource, U: Accessor>(&self) -> Groups<G, U> {
        Groups::new(self.clone())
    }

    pub fn resources(&self) -> Resources {
        Resources::new(self.clone())
    }

    pub fn users<U: Accessor>(&self) -> Users<U> {
        Users::new(self.clone())
    }
}

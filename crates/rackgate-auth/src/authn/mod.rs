use crate::errors::{self, AuthError};
use crate::model::{AuthnInput, Caller};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

pub mod local;
pub mod session;
pub mod token;

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Name operations use to select this strategy.
    fn strategy(&self) -> &'static str;
    async fn authenticate(&self, input: &AuthnInput) -> Result<Caller, AuthError>;
}

/// Strategies keyed by name; dispatch is chosen per operation.
#[derive(Clone, Default)]
pub struct AuthenticatorSet {
    strategies: HashMap<&'static str, Arc<dyn Authenticator>>,
}

impl AuthenticatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.strategies
            .insert(authenticator.strategy(), authenticator);
        self
    }

    pub fn contains(&self, strategy: &str) -> bool {
        self.strategies.contains_key(strategy)
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.strategies.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub async fn authenticate(
        &self,
        strategy: &str,
        input: &AuthnInput,
    ) -> Result<Caller, AuthError> {
        let Some(authenticator) = self.strategies.get(strategy) else {
            return Err(errors::unauthenticated(&format!(
                "unknown authentication strategy '{strategy}'"
            )));
        };
        authenticator.authenticate(input).await
    }
}

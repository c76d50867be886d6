//! Shared state for the auth service handlers

use common::{middleware::Authenticator, revocation::RevocationList, token::TokenService};
use std::sync::Arc;

use crate::{rate_limiter::RateLimiter, repositories::UserStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub tokens: TokenService,
    pub revocations: Option<Arc<dyn RevocationList>>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Authenticator that verifies tokens issued by this state
    pub fn authenticator(&self) -> Authenticator {
        let authenticator = Authenticator::new(self.tokens.clone());
        match &self.revocations {
            Some(revocations) => authenticator.with_revocations(revocations.clone()),
            None => authenticator,
        }
    }
}

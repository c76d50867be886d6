//! Middleware for bearer token validation and authentication

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::{
    error::{AuthRejection, ServiceError},
    revocation::RevocationList,
    token::{Claims, TokenError, TokenService},
};

/// Authenticated caller, inserted into request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub token_id: Uuid,
    pub expires_at: i64,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            id: claims.sub,
            token_id: claims.jti,
            expires_at: claims.exp,
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ServiceError::AuthRejected(AuthRejection::NoToken))
    }
}

/// Verifies the `Authorization` header of incoming requests
#[derive(Clone)]
pub struct Authenticator {
    tokens: TokenService,
    revocations: Option<Arc<dyn RevocationList>>,
}

impl Authenticator {
    pub fn new(tokens: TokenService) -> Self {
        Self {
            tokens,
            revocations: None,
        }
    }

    /// Also reject tokens whose id is on the revocation list
    pub fn with_revocations(mut self, revocations: Arc<dyn RevocationList>) -> Self {
        self.revocations = Some(revocations);
        self
    }

    /// Resolve the caller from an `Authorization` header value
    pub async fn authenticate(
        &self,
        header: Option<&HeaderValue>,
    ) -> Result<AuthUser, ServiceError> {
        let header = header.ok_or(ServiceError::AuthRejected(AuthRejection::NoToken))?;

        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or(ServiceError::AuthRejected(AuthRejection::Malformed))?;

        let claims = self.tokens.verify(token).map_err(|e| {
            debug!("Token rejected: {}", e);
            ServiceError::AuthRejected(match e {
                TokenError::Malformed => AuthRejection::Malformed,
                TokenError::Expired => AuthRejection::Expired,
                TokenError::InvalidSignature => AuthRejection::InvalidSignature,
            })
        })?;

        if let Some(revocations) = &self.revocations {
            let revoked = revocations.is_revoked(claims.jti).await.map_err(|e| {
                error!("Failed to check token revocation: {}", e);
                ServiceError::Internal("revocation list unavailable".to_string())
            })?;

            if revoked {
                warn!("Revoked token presented by user {}", claims.sub);
                return Err(ServiceError::AuthRejected(AuthRejection::Revoked));
            }
        }

        Ok(claims.into())
    }
}

/// Reject the request unless it carries a valid bearer token
///
/// On success the `AuthUser` is added to the request extensions for handlers.
pub async fn require_auth(
    State(authenticator): State<Authenticator>,
    mut req: Request,
    next: Next,
) -> Response {
    let header = req.headers().get(header::AUTHORIZATION).cloned();

    match authenticator.authenticate(header.as_ref()).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(rejection) => rejection.into_response(),
    }
}

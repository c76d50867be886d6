//! Token service for issuing and verifying bearer tokens
//!
//! Tokens are HS256 JWTs signed with a shared secret. Verification is a pure
//! function of the token, the secret and the supplied clock: no storage is
//! consulted, which is what lets every service verify tokens minted by the
//! auth service.

use anyhow::Result;
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Default token lifetime: 7 days
pub const DEFAULT_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Token configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Shared secret used to sign and verify tokens
    pub secret: String,
    /// Token lifetime in seconds
    pub expiry_seconds: i64,
}

impl TokenConfig {
    /// Create a new TokenConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: Shared signing secret (required)
    /// - `JWT_EXPIRY_SECONDS`: Token lifetime in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        if secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let expiry_seconds = std::env::var("JWT_EXPIRY_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|seconds: &i64| *seconds > 0)
            .unwrap_or(DEFAULT_EXPIRY_SECONDS);

        Ok(TokenConfig {
            secret,
            expiry_seconds,
        })
    }
}

/// Claims carried by every token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Token ID, the handle used for revocation
    pub jti: Uuid,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration time (unix seconds)
    pub exp: i64,
}

/// Reasons a token fails verification
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token has expired")]
    Expired,
    #[error("token signature is invalid")]
    InvalidSignature,
}

/// A freshly minted token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Issues and verifies signed bearer tokens
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry_seconds: i64,
}

impl TokenService {
    /// Initialize a new token service
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller-supplied clock in `verify_at`.
        validation.validate_exp = false;
        validation.leeway = 0;

        TokenService {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            expiry_seconds: config.expiry_seconds,
        }
    }

    /// Token lifetime in seconds
    pub fn expiry_seconds(&self) -> i64 {
        self.expiry_seconds
    }

    /// Issue a token for a user, valid from now
    pub fn issue(&self, user_id: Uuid) -> Result<IssuedToken> {
        self.issue_at(user_id, Utc::now().timestamp())
    }

    /// Issue a token as if the clock read `now` (unix seconds)
    pub fn issue_at(&self, user_id: Uuid, now: i64) -> Result<IssuedToken> {
        let claims = Claims {
            sub: user_id,
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + self.expiry_seconds,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(IssuedToken { token, claims })
    }

    /// Verify a token against the current time
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify a token as if the clock read `now` (unix seconds)
    ///
    /// The signature is checked before the expiry, so a tampered token is
    /// reported as `InvalidSignature` even when it is also past its expiry.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        if !is_well_formed(token) {
            return Err(TokenError::Malformed);
        }

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            }
        })?;

        if now > data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}

/// Check the three-segment `header.payload.signature` shape
pub fn is_well_formed(token: &str) -> bool {
    let segments: Vec<&str> = token.split('.').collect();
    segments.len() == 3
        && segments.iter().all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'='))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&TokenConfig {
            secret: secret.to_string(),
            expiry_seconds: 3600,
        })
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service("test-secret");
        let user_id = Uuid::new_v4();

        let issued = tokens.issue(user_id).unwrap();
        let claims = tokens.verify(&issued.token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims, issued.claims);
    }

    #[test]
    fn test_each_token_has_its_own_id() {
        let tokens = service("test-secret");
        let user_id = Uuid::new_v4();
        let first = tokens.issue(user_id).unwrap();
        let second = tokens.issue(user_id).unwrap();
        assert_ne!(first.claims.jti, second.claims.jti);
    }

    #[test]
    fn test_token_valid_until_expiry_instant() {
        let tokens = service("test-secret");
        let issued = tokens.issue_at(Uuid::new_v4(), 1_000).unwrap();

        assert!(tokens.verify_at(&issued.token, 4_600).is_ok());
        assert_eq!(
            tokens.verify_at(&issued.token, 4_601),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let issued = service("secret-1").issue(Uuid::new_v4()).unwrap();
        let result = service("secret-2").verify(&issued.token);
        assert_eq!(result, Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_expired_token_with_wrong_secret_is_invalid_signature() {
        let issued = service("secret-1").issue_at(Uuid::new_v4(), 0).unwrap();
        let result = service("secret-2").verify_at(&issued.token, 1_000_000);
        assert_eq!(result, Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_tampered_payload_is_invalid_signature() {
        let tokens = service("test-secret");
        let a = tokens.issue(Uuid::new_v4()).unwrap();
        let b = tokens.issue(Uuid::new_v4()).unwrap();

        let a_parts: Vec<&str> = a.token.split('.').collect();
        let b_parts: Vec<&str> = b.token.split('.').collect();
        let forged = format!("{}.{}.{}", a_parts[0], b_parts[1], a_parts[2]);

        assert_eq!(tokens.verify(&forged), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_not_a_jwt_is_malformed() {
        let tokens = service("test-secret");
        assert_eq!(tokens.verify("not-a-jwt"), Err(TokenError::Malformed));
        assert_eq!(tokens.verify(""), Err(TokenError::Malformed));
        assert_eq!(tokens.verify("a..c"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_three_segments_of_garbage_is_malformed() {
        let tokens = service("test-secret");
        assert_eq!(tokens.verify("abc.def.ghi"), Err(TokenError::Malformed));
    }

    proptest! {
        #[test]
        fn prop_tokens_older_than_expiry_are_expired(age in 3601i64..10_000_000) {
            let tokens = service("prop-secret");
            let now = 1_700_000_000;
            let issued = tokens.issue_at(Uuid::new_v4(), now - age).unwrap();
            prop_assert_eq!(tokens.verify_at(&issued.token, now), Err(TokenError::Expired));
        }

        #[test]
        fn prop_fewer_than_three_segments_is_malformed(
            raw in "[A-Za-z0-9_-]{0,40}(\\.[A-Za-z0-9_-]{1,40})?"
        ) {
            let tokens = service("prop-secret");
            prop_assert_eq!(tokens.verify(&raw), Err(TokenError::Malformed));
        }

        #[test]
        fn prop_more_than_three_segments_is_malformed(
            raw in "[A-Za-z0-9_-]{1,20}(\\.[A-Za-z0-9_-]{1,20}){3,6}"
        ) {
            let tokens = service("prop-secret");
            prop_assert_eq!(tokens.verify(&raw), Err(TokenError::Malformed));
        }
    }
}

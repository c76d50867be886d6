//! Typed HTTP client for the auth service

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::state::{Profile, ProfileFailure};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Token has expired")]
    TokenExpired,

    #[error("Token has been revoked")]
    TokenRevoked,

    #[error("Request rejected with {status}: {message}")]
    Rejected {
        status: u16,
        reason: Option<String>,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// What a failed profile fetch means for the session
    pub fn profile_failure(&self) -> ProfileFailure {
        match self {
            ClientError::TokenExpired => ProfileFailure::Expired,
            ClientError::TokenRevoked => ProfileFailure::Revoked,
            _ => ProfileFailure::Other,
        }
    }
}

/// Token issued by signup or login
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenGrant {
    pub token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
struct SignupBody<'a> {
    full_name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LogoutBody {
    #[serde(default)]
    revoked: bool,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    base_url: String,
    http: Client,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn signup(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<TokenGrant, ClientError> {
        let body = SignupBody {
            full_name,
            email,
            password,
        };
        self.send(self.http.post(self.url("/auth/signup")).json(&body))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<TokenGrant, ClientError> {
        let body = LoginBody { email, password };
        self.send(self.http.post(self.url("/auth/login")).json(&body))
            .await
    }

    /// Profile of the token's owner
    pub async fn me(&self, token: &str) -> Result<Profile, ClientError> {
        self.send(self.http.get(self.url("/auth/me")).bearer_auth(token))
            .await
    }

    /// Returns whether the server revoked the token
    pub async fn logout(&self, token: &str) -> Result<bool, ClientError> {
        let body: LogoutBody = self
            .send(self.http.post(self.url("/auth/logout")).bearer_auth(token))
            .await?;
        Ok(body.revoked)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(classify(status, &body));
        }

        serde_json::from_slice(&body).map_err(|e| {
            debug!("Undecodable auth body: {}", String::from_utf8_lossy(&body));
            ClientError::InvalidResponse(e.to_string())
        })
    }
}

fn classify(status: StatusCode, body: &[u8]) -> ClientError {
    let parsed = serde_json::from_slice::<ErrorBody>(body).ok();
    let (reason, message) = match parsed {
        Some(b) => (b.reason, b.error.or(b.message).unwrap_or_default()),
        None => (None, String::from_utf8_lossy(body).into_owned()),
    };

    if status == StatusCode::FORBIDDEN {
        match reason.as_deref() {
            Some("expired") => return ClientError::TokenExpired,
            Some("revoked") => return ClientError::TokenRevoked,
            None if message == "Token has expired" => return ClientError::TokenExpired,
            _ => {}
        }
    }

    warn!("Auth service responded with {}: {}", status, message);
    ClientError::Rejected {
        status: status.as_u16(),
        reason,
        message,
    }
}

//! Custom error types for the common library
//!
//! This module defines the error types shared by every service: storage
//! errors raised by repositories, upstream errors raised by HTTP clients of
//! external services, and the `ServiceError` taxonomy that handlers return
//! and that renders as a JSON error response.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use sqlx::Error as SqlxError;
use thiserror::Error;
use tracing::error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),

    /// A unique key already holds the value being written
    #[error("Duplicate value for {field}")]
    Conflict { field: String },
}

impl DatabaseError {
    /// Wrap a query error, turning unique-key violations into `Conflict`.
    ///
    /// `field_for` maps a constraint name to the API field it guards.
    pub fn from_query(err: SqlxError, field_for: impl Fn(&str) -> &'static str) -> Self {
        if let SqlxError::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let field = field_for(db_err.constraint().unwrap_or_default());
                return DatabaseError::Conflict {
                    field: field.to_string(),
                };
            }
        }
        DatabaseError::Query(err)
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Why the auth middleware turned a request away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    NoToken,
    Malformed,
    Expired,
    InvalidSignature,
    Revoked,
}

impl AuthRejection {
    /// Machine-readable reason sent to clients
    pub fn reason(&self) -> &'static str {
        match self {
            AuthRejection::NoToken => "no_token",
            AuthRejection::Malformed => "malformed",
            AuthRejection::Expired => "expired",
            AuthRejection::InvalidSignature => "invalid_signature",
            AuthRejection::Revoked => "revoked",
        }
    }

    fn message(&self) -> &'static str {
        match self {
            AuthRejection::NoToken => "Unauthorized",
            AuthRejection::Malformed => "Invalid token format",
            AuthRejection::Expired => "Token has expired",
            AuthRejection::InvalidSignature => "Invalid or malformed token",
            AuthRejection::Revoked => "Token has been revoked",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AuthRejection::NoToken => StatusCode::UNAUTHORIZED,
            _ => StatusCode::FORBIDDEN,
        }
    }
}

/// Failure talking to an external HTTP collaborator
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// The service could not be reached or the connection broke
    #[error("{service} is unavailable: {message}")]
    Unreachable { service: String, message: String },

    /// The service answered with a non-success status
    #[error("{service} responded with {status}: {message}")]
    Status {
        service: String,
        status: u16,
        message: String,
    },

    /// The service answered 2xx but the body was not the expected JSON
    #[error("{service} returned an invalid response: {message}")]
    InvalidResponse { service: String, message: String },
}

impl UpstreamError {
    pub fn service(&self) -> &str {
        match self {
            UpstreamError::Unreachable { service, .. }
            | UpstreamError::Status { service, .. }
            | UpstreamError::InvalidResponse { service, .. } => service,
        }
    }

    /// Status the upstream answered with, when it answered at all
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error taxonomy returned by HTTP handlers
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Authentication rejected: {}", .0.reason())]
    AuthRejected(AuthRejection),

    #[error("Validation failed on {field}: {reason}")]
    ValidationFailed { field: String, reason: String },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{resource} {key} not found")]
    NotFound { resource: &'static str, key: String },

    #[error("Conflict on {field}: {message}")]
    Conflict { field: String, message: String },

    #[error("Too many attempts")]
    RateLimited,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ServiceError::ValidationFailed {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(resource: &'static str, key: impl ToString) -> Self {
        ServiceError::NotFound {
            resource,
            key: key.to_string(),
        }
    }

    pub fn conflict(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::Conflict {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::AuthRejected(rejection) => rejection.status(),
            ServiceError::ValidationFailed { .. }
            | ServiceError::InvalidCredentials
            | ServiceError::Conflict { .. } => StatusCode::BAD_REQUEST,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ServiceError::Upstream(UpstreamError::Unreachable { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ServiceError::Upstream(UpstreamError::Status { status, .. })
                if (400..500).contains(status) =>
            {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ServiceError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        match self {
            ServiceError::AuthRejected(rejection) => json!({
                "error": rejection.message(),
                "kind": "auth_rejected",
                "reason": rejection.reason(),
            }),
            ServiceError::ValidationFailed { field, reason } => json!({
                "error": reason,
                "kind": "validation_failed",
                "field": field,
            }),
            ServiceError::InvalidCredentials => json!({
                "error": "Invalid credentials",
                "kind": "invalid_credentials",
            }),
            ServiceError::NotFound { resource, key } => json!({
                "error": format!("{} not found", resource),
                "kind": "not_found",
                "resource": resource,
                "key": key,
            }),
            ServiceError::Conflict { field, message } => json!({
                "error": message,
                "kind": "conflict",
                "field": field,
            }),
            ServiceError::RateLimited => json!({
                "error": "Too many attempts, try again later",
                "kind": "rate_limited",
            }),
            ServiceError::Upstream(err) => {
                let kind = if self.status() == StatusCode::UNPROCESSABLE_ENTITY {
                    "upstream_rejected"
                } else {
                    "upstream_failure"
                };
                json!({
                    "error": err.to_string(),
                    "kind": kind,
                    "service": err.service(),
                    "upstreamStatus": err.upstream_status(),
                })
            }
            ServiceError::Internal(_) => json!({
                "error": "Internal server error",
                "kind": "internal_error",
            }),
        }
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Conflict { field } => {
                let message = format!("{} already exists", field);
                ServiceError::Conflict { field, message }
            }
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::validation("body", rejection.body_text())
    }
}

impl From<PathRejection> for ServiceError {
    fn from(rejection: PathRejection) -> Self {
        ServiceError::validation("path", rejection.body_text())
    }
}

impl From<QueryRejection> for ServiceError {
    fn from(rejection: QueryRejection) -> Self {
        ServiceError::validation("query", rejection.body_text())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        if let ServiceError::Internal(detail) = &self {
            error!("Internal error: {}", detail);
        }
        (self.status(), Json(self.body())).into_response()
    }
}

/// Type alias for handler results
pub type ServiceResult<T> = Result<T, ServiceError>;

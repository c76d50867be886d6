//! Authentication service routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use common::{
    error::{DatabaseError, ServiceError, ServiceResult},
    middleware::AuthUser,
    policy::{Access, PolicyOverrides, RouteTable, Verb},
};
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    models::{LoginRequest, LogoutResponse, NewUser, SignupRequest, TokenResponse, UserProfile},
    password,
    state::AppState,
    validation::{validate_login, validate_signup},
};

/// Create the router for the authentication service
pub fn create_router(state: AppState, overrides: PolicyOverrides) -> Router {
    RouteTable::new(state.authenticator(), overrides)
        .route(Verb::Get, "/health", Access::Public, health_check)
        .route(Verb::Post, "/auth/signup", Access::Public, signup)
        .route(Verb::Post, "/auth/login", Access::Public, login)
        .route(Verb::Get, "/auth/me", Access::Protected, me)
        .route(Verb::Post, "/auth/logout", Access::Protected, logout)
        .into_router()
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Response {
    let database = state.users.health_check().await.unwrap_or(false);
    let (status, label) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": "auth-service",
            "database": database,
        })),
    )
        .into_response()
}

fn email_conflict() -> ServiceError {
    ServiceError::conflict("email", "Email already exists")
}

fn issue_token(
    state: &AppState,
    user_id: uuid::Uuid,
    message: &'static str,
) -> ServiceResult<TokenResponse> {
    let issued = state.tokens.issue(user_id).map_err(|e| {
        error!("Failed to issue token: {}", e);
        ServiceError::Internal("token issuance failed".to_string())
    })?;

    Ok(TokenResponse {
        message,
        token: issued.token,
        token_type: "Bearer",
        expires_in: state.tokens.expiry_seconds(),
    })
}

/// User signup endpoint
pub async fn signup(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<SignupRequest>, ServiceError>,
) -> ServiceResult<(StatusCode, Json<TokenResponse>)> {
    let valid = validate_signup(payload)?;
    info!("Signup attempt for {}", valid.email);

    if state.users.find_by_email(&valid.email).await?.is_some() {
        return Err(email_conflict());
    }

    let plain = valid.password;
    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| ServiceError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(|e| ServiceError::Internal(e.to_string()))?;

    let user = state
        .users
        .create(&NewUser {
            full_name: valid.full_name,
            email: valid.email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            DatabaseError::Conflict { .. } => email_conflict(),
            other => other.into(),
        })?;

    info!("User {} registered", user.id);
    let response = issue_token(&state, user.id, "User registered successfully")?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, ServiceError>,
) -> ServiceResult<Json<TokenResponse>> {
    let valid = validate_login(payload)?;

    if !state.rate_limiter.is_allowed(&valid.email).await {
        warn!("Login rate limit hit for {}", valid.email);
        return Err(ServiceError::RateLimited);
    }

    let Some(user) = state.users.find_by_email(&valid.email).await? else {
        info!("Login for unknown email {}", valid.email);
        return Err(ServiceError::InvalidCredentials);
    };

    let plain = valid.password;
    let stored_hash = user.password_hash.clone();
    let matches =
        tokio::task::spawn_blocking(move || password::verify_password(&plain, &stored_hash))
            .await
            .map_err(|e| ServiceError::Internal(format!("verification task failed: {}", e)))?
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

    if !matches {
        info!("Wrong password for {}", valid.email);
        return Err(ServiceError::InvalidCredentials);
    }

    state.rate_limiter.reset(&valid.email).await;
    info!("User {} logged in", user.id);
    Ok(Json(issue_token(&state, user.id, "Login successful")?))
}

/// Profile of the authenticated caller
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> ServiceResult<Json<UserProfile>> {
    let profile = state
        .users
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User", user.id))?;

    Ok(Json(profile.into()))
}

/// Logout endpoint
///
/// Without a revocation list the token stays valid until it expires and the
/// client is expected to discard it.
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> ServiceResult<Json<LogoutResponse>> {
    let Some(revocations) = &state.revocations else {
        return Ok(Json(LogoutResponse {
            message: "Logged out successfully",
            revoked: false,
        }));
    };

    let remaining = user.expires_at.saturating_sub(Utc::now().timestamp()).max(0) as u64;
    revocations
        .revoke(user.token_id, remaining)
        .await
        .map_err(|e| ServiceError::Internal(format!("failed to revoke token: {}", e)))?;

    info!("User {} logged out, token {} revoked", user.id, user.token_id);
    Ok(Json(LogoutResponse {
        message: "Logged out successfully",
        revoked: true,
    }))
}

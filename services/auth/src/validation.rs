//! Input validation utilities

use common::error::ServiceError;
use regex::Regex;
use std::sync::OnceLock;

use crate::models::{LoginRequest, SignupRequest};

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Signup input after validation and normalisation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSignup {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

/// Login input after normalisation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidLogin {
    pub email: String,
    pub password: String,
}

/// Trim and lower-case an email so lookups are case-insensitive
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate full name
pub fn validate_full_name(full_name: &str) -> Result<(), String> {
    if full_name.trim().is_empty() {
        return Err("Full name is required".to_string());
    }

    if full_name.chars().count() > 100 {
        return Err("Full name must be at most 100 characters long".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at most {} characters long",
            MAX_PASSWORD_LENGTH
        ));
    }

    Ok(())
}

fn check(field: &str, result: Result<(), String>) -> Result<(), ServiceError> {
    result.map_err(|reason| ServiceError::validation(field, reason))
}

/// Validate a signup request, naming the first offending field
pub fn validate_signup(request: SignupRequest) -> Result<ValidSignup, ServiceError> {
    let full_name = request.full_name.unwrap_or_default().trim().to_string();
    let email = normalize_email(&request.email.unwrap_or_default());
    let password = request.password.unwrap_or_default();

    check("full_name", validate_full_name(&full_name))?;
    check("email", validate_email(&email))?;
    check("password", validate_password(&password))?;

    Ok(ValidSignup {
        full_name,
        email,
        password,
    })
}

/// Check a login request carries both credentials
///
/// Format rules are not applied here; a malformed email simply fails to match.
pub fn validate_login(request: LoginRequest) -> Result<ValidLogin, ServiceError> {
    let email = normalize_email(&request.email.unwrap_or_default());
    let password = request.password.unwrap_or_default();

    if email.is_empty() {
        return Err(ServiceError::validation("email", "Email is required"));
    }
    if password.is_empty() {
        return Err(ServiceError::validation("password", "Password is required"));
    }

    Ok(ValidLogin { email, password })
}

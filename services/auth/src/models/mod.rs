//! Authentication service models

pub mod user;

// Re-export for convenience
pub use user::{
    LoginRequest, LogoutResponse, NewUser, SignupRequest, TokenResponse, User, UserProfile,
};

//! Credential store

use async_trait::async_trait;
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::{NewUser, User};

pub mod user;

#[cfg(test)]
pub mod memory;

pub use user::UserRepository;

/// Storage of user accounts keyed by email
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; a taken email fails with `DatabaseError::Conflict`
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User>;

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>>;

    /// Whether the backing store is reachable
    async fn health_check(&self) -> DatabaseResult<bool>;
}

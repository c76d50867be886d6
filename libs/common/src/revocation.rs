//! Server-side token revocation
//!
//! Tokens are stateless, so logout is client-local unless a revocation list
//! is configured. Entries are keyed by token id and expire together with the
//! token they revoke.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::cache::RedisPool;

/// Set of revoked token ids
#[async_trait]
pub trait RevocationList: Send + Sync {
    /// Revoke a token id for `ttl_seconds`
    async fn revoke(&self, token_id: Uuid, ttl_seconds: u64) -> Result<()>;

    /// Whether a token id has been revoked
    async fn is_revoked(&self, token_id: Uuid) -> Result<bool>;
}

/// Revocation list shared between services through Redis
pub struct RedisRevocationList {
    redis_pool: RedisPool,
}

impl RedisRevocationList {
    pub fn new(redis_pool: RedisPool) -> Self {
        Self { redis_pool }
    }

    fn key(token_id: Uuid) -> String {
        format!("revoked_token:{}", token_id)
    }
}

#[async_trait]
impl RevocationList for RedisRevocationList {
    async fn revoke(&self, token_id: Uuid, ttl_seconds: u64) -> Result<()> {
        info!("Revoking token {} for {} seconds", token_id, ttl_seconds);
        self.redis_pool
            .set(&Self::key(token_id), "1", Some(ttl_seconds.max(1)))
            .await
    }

    async fn is_revoked(&self, token_id: Uuid) -> Result<bool> {
        Ok(self.redis_pool.get(&Self::key(token_id)).await?.is_some())
    }
}

/// Process-local revocation list
#[derive(Clone, Default)]
pub struct MemoryRevocationList {
    entries: Arc<Mutex<HashMap<Uuid, Instant>>>,
}

impl MemoryRevocationList {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationList for MemoryRevocationList {
    async fn revoke(&self, token_id: Uuid, ttl_seconds: u64) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.retain(|_, expires| *expires > now);
        entries.insert(token_id, now + Duration::from_secs(ttl_seconds));
        Ok(())
    }

    async fn is_revoked(&self, token_id: Uuid) -> Result<bool> {
        let entries = self.entries.lock().await;
        Ok(entries
            .get(&token_id)
            .is_some_and(|expires| *expires > Instant::now()))
    }
}

use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

mod models;
mod password;
mod rate_limiter;
mod repositories;
mod routes;
mod state;
mod validation;

use common::{
    cache::{RedisConfig, RedisPool},
    database::{self, DatabaseConfig},
    revocation::{RedisRevocationList, RevocationList},
    settings::ServerSettings,
    telemetry::init_tracing,
    token::{TokenConfig, TokenService},
};

use crate::{
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::UserRepository,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("authentication service")?;

    let settings = ServerSettings::load("AUTH", 3000)?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }
    database::run_migrations(&pool).await?;

    let tokens = TokenService::new(&TokenConfig::from_env()?);

    // Revocation is only available when Redis is configured
    let revocations: Option<Arc<dyn RevocationList>> = match RedisConfig::from_env() {
        Some(redis_config) => {
            let redis_pool = RedisPool::new(&redis_config).await?;
            info!("Token revocation enabled");
            Some(Arc::new(RedisRevocationList::new(redis_pool)))
        }
        None => {
            info!("REDIS_URL not set, logout is client-local");
            None
        }
    };

    let app_state = AppState {
        users: Arc::new(UserRepository::new(pool)),
        tokens,
        revocations,
        rate_limiter: RateLimiter::new(RateLimiterConfig::default()),
    };

    let app = routes::create_router(app_state, settings.policy_overrides())
        .layer(settings.cors_layer())
        .layer(TraceLayer::new_for_http());

    let addr = settings.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Authentication service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

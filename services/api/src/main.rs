use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

mod ml;
mod models;
mod repositories;
mod routes;
mod state;

use common::{
    cache::{RedisConfig, RedisPool},
    database::{self, DatabaseConfig},
    middleware::Authenticator,
    revocation::RedisRevocationList,
    settings::ServerSettings,
    telemetry::init_tracing,
    token::{TokenConfig, TokenService},
};

use crate::{
    ml::{HttpMlClient, MlServiceConfig},
    repositories::EmployeeRepository,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("API service")?;

    let settings = ServerSettings::load("API", 3001)?;

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

    // Tokens are minted by the auth service; only the shared secret is needed here
    let tokens = TokenService::new(&TokenConfig::from_env()?);
    let mut authenticator = Authenticator::new(tokens);
    if let Some(redis_config) = RedisConfig::from_env() {
        let redis_pool = RedisPool::new(&redis_config).await?;
        authenticator =
            authenticator.with_revocations(Arc::new(RedisRevocationList::new(redis_pool)));
        info!("Token revocation checks enabled");
    }

    let ml_config = MlServiceConfig::from_env();
    info!("Using ML service at {}", ml_config.base_url);
    let ml = HttpMlClient::new(&ml_config)?;

    let app_state = AppState {
        employees: Arc::new(EmployeeRepository::new(pool)),
        ml: Arc::new(ml),
        authenticator,
        at_risk_threshold: settings.at_risk_threshold,
    };

    let app = routes::create_router(app_state, settings.policy_overrides())
        .layer(settings.cors_layer())
        .layer(TraceLayer::new_for_http());

    let addr = settings.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("API service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

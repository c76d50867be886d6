//! Common library for the Prescient services
//!
//! This crate provides shared functionality used across the auth and api
//! services: database connectivity, the bearer token service and the
//! middleware that enforces it, the declarative route policy, error
//! handling, and configuration and logging setup.
//!
//! ```rust,no_run
//! use common::middleware::Authenticator;
//! use common::policy::{Access, PolicyOverrides, RouteTable, Verb};
//! use common::token::{TokenConfig, TokenService};
//!
//! async fn me() -> &'static str {
//!     "me"
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let tokens = TokenService::new(&TokenConfig::from_env()?);
//!     let _router: axum::Router =
//!         RouteTable::new(Authenticator::new(tokens), PolicyOverrides::default())
//!             .route(Verb::Get, "/auth/me", Access::Protected, me)
//!             .into_router();
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod database;
pub mod error;
pub mod middleware;
pub mod policy;
pub mod revocation;
pub mod settings;
pub mod telemetry;
pub mod token;

//! HTTP server settings loaded with the `config` crate
//!
//! Values come from built-in defaults overridden by `<PREFIX>_*` environment
//! variables, e.g. `API_PORT=8080` or `API_PUBLIC_ROUTES="GET /health,GET /employees"`.

use axum::http::HeaderValue;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::policy::PolicyOverrides;

/// Settings shared by every HTTP service
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; any origin when empty
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Declared routes opened to unauthenticated callers, as `"METHOD /path"`
    #[serde(default)]
    pub public_routes: Vec<String>,
    /// Attrition risk (percent) at or above which an employee counts as at risk
    #[serde(default = "default_at_risk_threshold")]
    pub at_risk_threshold: f64,
}

fn default_at_risk_threshold() -> f64 {
    30.0
}

impl ServerSettings {
    /// Load settings for the service whose variables start with `prefix`
    pub fn load(prefix: &str, default_port: u16) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", i64::from(default_port))?
            .add_source(
                Environment::with_prefix(prefix)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_origins")
                    .with_list_parse_key("public_routes"),
            )
            .build()?
            .try_deserialize()
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    pub fn policy_overrides(&self) -> PolicyOverrides {
        PolicyOverrides::parse(&self.public_routes)
    }

    /// CORS layer for the configured origins; any origin when none are set
    pub fn cors_layer(&self) -> CorsLayer {
        let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        if self.cors_origins.is_empty() {
            return layer.allow_origin(Any);
        }

        let origins: Vec<HeaderValue> = self
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        layer.allow_origin(origins)
    }
}

//! Declarative per-route access policy
//!
//! Services declare every route together with its access level. Protected
//! routes are wrapped in [`require_auth`]; public ones are not. Deployments
//! may open individual declared routes through [`PolicyOverrides`], which is
//! the only way a route becomes public besides its declaration.

use axum::{
    Router,
    handler::Handler,
    middleware,
    routing::{MethodFilter, on},
};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};

use crate::middleware::{Authenticator, require_auth};

/// HTTP verbs used by route declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    fn filter(self) -> MethodFilter {
        match self {
            Verb::Get => MethodFilter::GET,
            Verb::Post => MethodFilter::POST,
            Verb::Put => MethodFilter::PUT,
            Verb::Delete => MethodFilter::DELETE,
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "GET" => Some(Verb::Get),
            "POST" => Some(Verb::Post),
            "PUT" => Some(Verb::Put),
            "DELETE" => Some(Verb::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Access level of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Public,
    Protected,
}

/// One declared route and the access level it ended up with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    pub verb: Verb,
    pub path: &'static str,
    pub access: Access,
}

/// Routes a deployment has chosen to expose without authentication
#[derive(Debug, Clone, Default)]
pub struct PolicyOverrides {
    public: HashSet<(Verb, String)>,
}

impl PolicyOverrides {
    /// Parse entries of the form `"GET /employees"`
    pub fn parse<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut public = HashSet::new();
        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }
            let parsed = entry
                .split_once(char::is_whitespace)
                .and_then(|(verb, path)| Some((Verb::parse(verb)?, path.trim().to_string())));
            match parsed {
                Some(key) => {
                    public.insert(key);
                }
                None => warn!("Ignoring unparseable public route override: {:?}", entry),
            }
        }
        Self { public }
    }

    fn opens(&self, verb: Verb, path: &str) -> bool {
        self.public.contains(&(verb, path.to_string()))
    }
}

/// Router builder that records the access level of every route
pub struct RouteTable<S> {
    authenticator: Authenticator,
    overrides: PolicyOverrides,
    entries: Vec<RouteEntry>,
    router: Router<S>,
}

impl<S> RouteTable<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(authenticator: Authenticator, overrides: PolicyOverrides) -> Self {
        Self {
            authenticator,
            overrides,
            entries: Vec::new(),
            router: Router::new(),
        }
    }

    /// Declare a route
    pub fn route<H, T>(mut self, verb: Verb, path: &'static str, access: Access, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        let access = match access {
            Access::Protected if self.overrides.opens(verb, path) => {
                warn!("{} {} opened to unauthenticated access by override", verb, path);
                Access::Public
            }
            declared => declared,
        };

        let method_router = on(verb.filter(), handler);
        let method_router = match access {
            Access::Public => method_router,
            Access::Protected => method_router.route_layer(middleware::from_fn_with_state(
                self.authenticator.clone(),
                require_auth,
            )),
        };

        self.router = self.router.route(path, method_router);
        self.entries.push(RouteEntry { verb, path, access });
        self
    }

    /// Every declared route with its effective access level
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Finish the table, logging the effective policy
    pub fn into_router(self) -> Router<S> {
        for (verb, path) in &self.overrides.public {
            if !self
                .entries
                .iter()
                .any(|e| e.verb == *verb && e.path == path.as_str())
            {
                warn!("Public route override {} {} matches no declared route", verb, path);
            }
        }
        for entry in &self.entries {
            info!("route {} {} is {:?}", entry.verb, entry.path, entry.access);
        }
        self.router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{TokenConfig, TokenService};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn authenticator() -> (Authenticator, TokenService) {
        let tokens = TokenService::new(&TokenConfig {
            secret: "policy-secret".to_string(),
            expiry_seconds: 60,
        });
        (Authenticator::new(tokens.clone()), tokens)
    }

    async fn ok() -> &'static str {
        "ok"
    }

    fn table(overrides: PolicyOverrides) -> RouteTable<()> {
        let (auth, _) = authenticator();
        RouteTable::new(auth, overrides)
            .route(Verb::Get, "/open", Access::Public, ok)
            .route(Verb::Get, "/items", Access::Protected, ok)
            .route(Verb::Post, "/items", Access::Protected, ok)
    }

    async fn status(router: Router, method: &str, uri: &str) -> StatusCode {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        router.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let router = table(PolicyOverrides::default()).into_router();
        assert_eq!(status(router.clone(), "GET", "/open").await, StatusCode::OK);
        assert_eq!(
            status(router.clone(), "GET", "/items").await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(router, "POST", "/items").await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_valid_token_passes_protected_route() {
        let (auth, tokens) = authenticator();
        let router: Router = RouteTable::new(auth, PolicyOverrides::default())
            .route(Verb::Get, "/items", Access::Protected, ok)
            .into_router();
        let token = tokens.issue(uuid::Uuid::new_v4()).unwrap().token;

        let request = Request::builder()
            .uri("/items")
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_override_opens_only_named_verb() {
        let overrides = PolicyOverrides::parse(["GET /items"]);
        let table = table(overrides);

        assert!(table.entries().contains(&RouteEntry {
            verb: Verb::Get,
            path: "/items",
            access: Access::Public,
        }));
        assert!(table.entries().contains(&RouteEntry {
            verb: Verb::Post,
            path: "/items",
            access: Access::Protected,
        }));

        let router = table.into_router();
        assert_eq!(status(router.clone(), "GET", "/items").await, StatusCode::OK);
        assert_eq!(
            status(router, "POST", "/items").await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_override_parsing_skips_garbage() {
        let overrides = PolicyOverrides::parse(["", "FETCH /x", "get /employees", "nopath"]);
        assert!(overrides.opens(Verb::Get, "/employees"));
        assert_eq!(overrides.public.len(), 1);
    }
}

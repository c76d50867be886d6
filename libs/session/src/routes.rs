//! Client-side route classification

/// Where unauthenticated users are sent
pub const LOGIN_ROUTE: &str = "/login";

/// Main authenticated view, shown after login
pub const HOME_ROUTE: &str = "/dashboard";

/// Views reachable without a session
pub const PUBLIC_ROUTES: &[&str] = &["/", "/login", "/signup", "/solutions", "/contact"];

/// Path without query, fragment or trailing slash
fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// Whether `path` may be viewed without a session
pub fn is_public(path: &str) -> bool {
    PUBLIC_ROUTES.contains(&normalize(path))
}

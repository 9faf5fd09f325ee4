//! Route gate.
//!
//! Every request passes through [`route_gate`] before routing:
//!
//! 1. Static assets and the auth flow endpoints pass untouched
//! 2. Without a session, anything but a public page redirects to `/login`
//! 3. With a session, `/login` and `/signup` redirect to `/todos`
//!
//! A session is a non-empty access-token cookie. The token itself is not
//! checked here; handlers find out when the backend rejects it.
//!
//! # Example
//!
//! ```ignore
//! use axum::{middleware, Router};
//! use todo_sync_web::gate::route_gate;
//!
//! let app = Router::new()
//!     .route("/api/todos", get(list_todos))
//!     .layer(middleware::from_fn(route_gate));
//! ```

use crate::cookies;
use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use regex::Regex;
use std::sync::LazyLock;

/// Pages anyone may see
pub const PUBLIC_PATHS: [&str; 3] = ["/", "/login", "/signup"];

/// Where signed-out visitors are sent
pub const LOGIN_PATH: &str = "/login";

/// Where signed-in visitors are sent
pub const TODOS_PATH: &str = "/todos";

#[allow(clippy::expect_used)] // Literal pattern
static ASSET_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(?:svg|png|jpe?g|gif|webp)$").expect("invalid asset pattern")
});

/// OAuth redirects land under this prefix
const AUTH_PREFIX: &str = "/auth/";

/// Endpoints that establish or end a session
const SESSION_ENDPOINTS: [&str; 3] = ["/api/auth/signup", "/api/auth/login", "/api/auth/signout"];

/// What the gate does with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Let the request through
    Allow,
    /// Redirect to [`LOGIN_PATH`]
    RedirectToLogin,
    /// Redirect to [`TODOS_PATH`]
    RedirectToTodos,
}

/// Decide what happens to a request for `path`.
#[must_use]
pub fn decide(path: &str, has_session: bool) -> GateDecision {
    if is_static_asset(path) || is_exempt(path) {
        return GateDecision::Allow;
    }
    if !has_session && !PUBLIC_PATHS.contains(&path) {
        return GateDecision::RedirectToLogin;
    }
    if has_session && (path == "/login" || path == "/signup") {
        return GateDecision::RedirectToTodos;
    }
    GateDecision::Allow
}

/// Files served as-is, never gated
#[must_use]
pub fn is_static_asset(path: &str) -> bool {
    path.starts_with("/static/") || path == "/favicon.ico" || ASSET_FILE.is_match(path)
}

/// Sign-in flows and the health check must work without a session
fn is_exempt(path: &str) -> bool {
    path == "/health" || path.starts_with(AUTH_PREFIX) || SESSION_ENDPOINTS.contains(&path)
}

/// Middleware applying [`decide`] to every request.
pub async fn route_gate(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let has_session = cookies::has_session(request.headers());

    match decide(&path, has_session) {
        GateDecision::Allow => next.run(request).await,
        GateDecision::RedirectToLogin => {
            tracing::debug!(path = %path, "No session, redirecting to login");
            Redirect::temporary(LOGIN_PATH).into_response()
        },
        GateDecision::RedirectToTodos => {
            tracing::debug!(path = %path, "Already signed in, redirecting to todos");
            Redirect::temporary(TODOS_PATH).into_response()
        },
    }
}

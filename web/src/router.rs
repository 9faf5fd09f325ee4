//! HTTP router.
//!
//! Composes all handlers behind the route gate.

use crate::gate::route_gate;
use crate::handlers::{auth, health_check, todos};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the application router.
///
/// # Routes
///
/// - `POST /api/auth/signup` - Register with email and password
/// - `POST /api/auth/login` - Sign in with email and password
/// - `POST /api/auth/signout` - Sign out
/// - `GET /api/auth/user` - The signed-in user
/// - `GET /auth/google` - Start a Google sign-in
/// - `GET /auth/callback` - Finish an OAuth sign-in
/// - `GET /api/todos` - List todos
/// - `POST /api/todos` - Create a todo
/// - `PATCH /api/todos/:id` - Rename a todo
/// - `DELETE /api/todos/:id` - Delete a todo
/// - `POST /api/todos/:id/toggle` - Flip a todo's completion flag
/// - `GET /health` - Liveness
///
/// # Example
///
/// ```rust,ignore
/// let state = AppState::from_config(&config)?;
/// let listener = tokio::net::TcpListener::bind(config.addr()).await?;
/// axum::serve(listener, app_router(state)).await?;
/// ```
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/signup", post(auth::sign_up))
        .route("/api/auth/login", post(auth::sign_in))
        .route("/api/auth/signout", post(auth::sign_out))
        .route("/api/auth/user", get(auth::current_user))
        .route("/auth/google", get(auth::google))
        .route("/auth/callback", get(auth::callback))
        .route("/api/todos", get(todos::list_todos).post(todos::create_todo))
        .route(
            "/api/todos/:id",
            patch(todos::rename_todo).delete(todos::delete_todo),
        )
        .route("/api/todos/:id/toggle", post(todos::toggle_todo))
        .route("/health", get(health_check))
        .layer(middleware::from_fn(route_gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! JSON API over the todo store.
//!
//! Each request builds a [`RequestTodoStore`](crate::state::RequestTodoStore)
//! bound to the caller's session cookies, runs one operation, and answers
//! from the resulting state. Responses also carry the session cookies when
//! the backend renewed or ended the session.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use todos::{Todo, TodoCounts, TodoFilter, TodoId};

/// Query of `GET /api/todos`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ListQuery {
    /// Which todos to return; all when absent
    #[serde(default)]
    pub filter: TodoFilter,
}

/// Response to `GET /api/todos`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TodoListResponse {
    /// Filter that was applied
    pub filter: TodoFilter,
    /// Matching todos, newest first
    pub items: Vec<Todo>,
    /// Totals across all filters
    pub counts: TodoCounts,
}

/// Body of `POST /api/todos` and `PATCH /api/todos/:id`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TodoTextRequest {
    /// Todo text; surrounding whitespace is dropped
    pub text: String,
}

/// Body of `POST /api/todos/:id/toggle`.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ToggleRequest {
    /// Completion flag the caller currently sees
    pub completed: bool,
}

/// Response to `POST /api/todos/:id/toggle`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ToggleResponse {
    /// Toggled todo
    pub id: TodoId,
    /// Flag now stored
    pub completed: bool,
}

/// List the caller's todos.
///
/// # Endpoint
///
/// ```text
/// GET /api/todos?filter=all|active|completed
/// ```
///
/// # Errors
///
/// - 401 if the session is missing or rejected
/// - 502 if the repository fails
#[tracing::instrument(skip(state, headers))]
pub async fn list_todos(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    let session = state.session_for(&headers);
    let store = session.todo_store();

    let result = match store.refresh().await {
        Ok(()) => Ok(Json(TodoListResponse {
            filter: query.filter,
            items: store.visible(query.filter).await,
            counts: store.counts().await,
        })),
        Err(error) => Err(AppError::from(error)),
    };
    session.respond(result)
}

/// Create a todo.
///
/// # Endpoint
///
/// ```text
/// POST /api/todos
/// { "text": "buy milk" }
/// ```
///
/// # Errors
///
/// - 422 if the text is blank
/// - 401 if the session is missing or rejected
/// - 502 if the repository fails
#[tracing::instrument(skip_all)]
pub async fn create_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TodoTextRequest>,
) -> Response {
    let session = state.session_for(&headers);
    let result = session.todo_store().create(request.text).await.map(|todo| {
        tracing::info!(todo_id = %todo.id, "Todo created");
        (StatusCode::CREATED, Json(todo))
    });
    session.respond(result.map_err(AppError::from))
}

/// Rename a todo.
///
/// # Endpoint
///
/// ```text
/// PATCH /api/todos/:id
/// { "text": "buy oat milk" }
/// ```
///
/// # Errors
///
/// - 422 if the text is blank
/// - 502 if the repository fails, including when the todo is not visible
///   to the caller
#[tracing::instrument(skip(state, headers, request))]
pub async fn rename_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<TodoId>,
    Json(request): Json<TodoTextRequest>,
) -> Response {
    let session = state.session_for(&headers);
    let result = session.todo_store().rename(id, request.text).await;
    session.respond(result.map(Json).map_err(AppError::from))
}

/// Flip a todo's completion flag.
///
/// The caller sends the flag it currently sees; the stored flag becomes
/// its negation.
///
/// # Endpoint
///
/// ```text
/// POST /api/todos/:id/toggle
/// { "completed": false }
/// ```
///
/// # Errors
///
/// 502 if the repository fails.
#[tracing::instrument(skip(state, headers))]
pub async fn toggle_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<TodoId>,
    Json(request): Json<ToggleRequest>,
) -> Response {
    let session = state.session_for(&headers);
    let result = session
        .todo_store()
        .toggle_completion(id, request.completed)
        .await
        .map(|()| {
            Json(ToggleResponse {
                id,
                completed: !request.completed,
            })
        });
    session.respond(result.map_err(AppError::from))
}

/// Delete a todo.
///
/// # Endpoint
///
/// ```text
/// DELETE /api/todos/:id
/// ```
///
/// # Errors
///
/// 502 if the repository fails.
#[tracing::instrument(skip(state, headers))]
pub async fn delete_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<TodoId>,
) -> Response {
    let session = state.session_for(&headers);
    let result = session.todo_store().delete(id).await;
    session.respond(result.map(|()| StatusCode::NO_CONTENT).map_err(AppError::from))
}

//! Error types for web handlers.
//!
//! [`AppError`] turns domain and auth failures into JSON responses of the
//! form `{ "code": ..., "message": ... }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use todo_sync_supabase::{AuthError, SupabaseError};
use todos::TodoError;

/// Shown when sign-up hits an existing account
pub const ALREADY_REGISTERED: &str = "This email is already registered. Please login instead.";

/// Application error type for web handlers.
///
/// | source                              | status |
/// |-------------------------------------|--------|
/// | `TodoError::Unauthenticated`        | 401    |
/// | `TodoError::Validation`             | 422    |
/// | `TodoError::Repository`             | 502    |
/// | `AuthError::InvalidEmail` / `WeakPassword` | 422 |
/// | `AuthError::InvalidCredentials`     | 401    |
/// | auth API rejection (4xx)            | 400    |
/// | auth API unreachable or 5xx         | 502    |
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    code: &'static str,
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Attach the underlying error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// 401 Unauthorized
    #[must_use]
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthenticated", message)
    }

    /// 409 Conflict
    #[must_use]
    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    /// 422 Unprocessable Entity
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", message)
    }

    /// 502 Bad Gateway
    #[must_use]
    pub fn bad_gateway(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, code, message)
    }

    /// HTTP status of the response
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// User-facing message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
    code: &'a str,
    message: &'a str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    error = %source,
                    "Request failed"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "Request failed"
                ),
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<TodoError> for AppError {
    fn from(error: TodoError) -> Self {
        let status = match error {
            TodoError::Unauthenticated => StatusCode::UNAUTHORIZED,
            TodoError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            TodoError::Repository(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, error.code(), error.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidEmail | AuthError::WeakPassword { .. } => {
                Self::validation(error.to_string())
            },
            AuthError::InvalidCredentials => {
                Self::new(StatusCode::UNAUTHORIZED, "invalid_credentials", error.to_string())
            },
            AuthError::Backend(SupabaseError::Unauthorized(message)) => {
                Self::unauthenticated(message)
            },
            AuthError::Backend(SupabaseError::ApiError { status, message })
                if (400..500).contains(&status) =>
            {
                Self::new(StatusCode::BAD_REQUEST, "auth_error", message)
            },
            AuthError::Backend(backend) => Self::bad_gateway("auth_error", backend.message())
                .with_source(anyhow::Error::new(backend)),
        }
    }
}

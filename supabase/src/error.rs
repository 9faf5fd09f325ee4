//! Error types for the Supabase client

use thiserror::Error;
use todos::TodoError;

/// Result type alias for Supabase calls.
pub type Result<T> = std::result::Result<T, SupabaseError>;

/// Errors that can occur when talking to a Supabase project
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SupabaseError {
    /// A required environment variable is unset
    #[error("Missing {0} environment variable")]
    MissingConfig(&'static str),

    /// HTTP request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response parsing failed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Missing, expired, or revoked access token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// API returned an error
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },
}

impl SupabaseError {
    /// Build an error from a non-success response body.
    ///
    /// GoTrue and PostgREST name the human-readable field differently
    /// (`msg`, `message`, `error_description`, `error`); the first one
    /// present wins, falling back to the raw body.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                ["msg", "message", "error_description", "error"]
                    .iter()
                    .find_map(|key| value.get(key)?.as_str().map(str::to_string))
            })
            .unwrap_or_else(|| body.trim().to_string());

        if status == 401 {
            Self::Unauthorized(message)
        } else {
            Self::ApiError { status, message }
        }
    }

    /// The remote-supplied message, without the status prefix
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Unauthorized(message) | Self::ApiError { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<SupabaseError> for TodoError {
    fn from(error: SupabaseError) -> Self {
        match error {
            SupabaseError::Unauthorized(_) => Self::Unauthenticated,
            other => Self::Repository(other.message()),
        }
    }
}

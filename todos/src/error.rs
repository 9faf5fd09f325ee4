//! Error types for todo store operations.

use thiserror::Error;

/// Result type alias for todo operations.
pub type Result<T> = std::result::Result<T, TodoError>;

/// Failures reported to callers of the todo store.
///
/// The `Display` text of an error is what ends up in
/// [`TodoState::last_error`](crate::state::TodoState::last_error), so
/// remote-supplied messages are passed through verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TodoError {
    /// No active session.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Input rejected before any remote call was made.
    #[error("{0}")]
    Validation(String),

    /// Transport or remote fault, carrying the remote-supplied message.
    #[error("{0}")]
    Repository(String),
}

impl TodoError {
    /// Returns `true` for [`TodoError::Unauthenticated`].
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }

    /// Short machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Validation(_) => "validation_error",
            Self::Repository(_) => "repository_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_passes_remote_message_through() {
        let error = TodoError::Repository("permission denied for table todos".to_string());
        assert_eq!(error.to_string(), "permission denied for table todos");
        assert_eq!(TodoError::Unauthenticated.to_string(), "Not authenticated");
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(TodoError::Unauthenticated.code(), "unauthenticated");
        assert_eq!(TodoError::Validation(String::new()).code(), "validation_error");
        assert_eq!(TodoError::Repository(String::new()).code(), "repository_error");
        assert!(TodoError::Unauthenticated.is_unauthenticated());
    }
}

//! Actions for the todo store.
//!
//! Commands come from callers; result events are produced by the effects
//! the reducer returns for them and carry the outcome of one remote call.

use crate::error::TodoError;
use crate::state::{Todo, TodoId};

/// Commands and result events for the todo store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TodoAction {
    // ========== Commands ==========
    /// Command: Reload every todo of the current principal
    Refresh,

    /// Command: Create a todo
    Create {
        /// Todo text, trimmed by the reducer
        text: String,
    },

    /// Command: Flip the completion flag of a todo
    ToggleCompletion {
        /// Todo to toggle
        id: TodoId,
        /// The flag as the caller last saw it
        current: bool,
    },

    /// Command: Replace the text of a todo
    Rename {
        /// Todo to rename
        id: TodoId,
        /// New text, trimmed by the reducer
        text: String,
    },

    /// Command: Delete a todo
    Delete {
        /// Todo to delete
        id: TodoId,
    },

    // ========== Events ==========
    /// Event: The repository returned the full list
    TodosLoaded {
        /// Todos, newest first
        todos: Vec<Todo>,
    },

    /// Event: A refresh failed
    RefreshFailed {
        /// Why it failed
        error: TodoError,
    },

    /// Event: The repository stored a new todo
    TodoCreated {
        /// Stored row
        todo: Todo,
    },

    /// Event: A create failed
    CreateFailed {
        /// Why it failed
        error: TodoError,
    },

    /// Event: The repository accepted a completion update
    CompletionConfirmed {
        /// Toggled todo
        id: TodoId,
        /// Flag now stored remotely
        completed: bool,
    },

    /// Event: A completion update failed
    ToggleFailed {
        /// Todo to revert
        id: TodoId,
        /// Flag to restore
        previous: bool,
        /// Why it failed
        error: TodoError,
    },

    /// Event: The repository returned a renamed todo
    TodoRenamed {
        /// Updated row
        todo: Todo,
    },

    /// Event: A rename failed
    RenameFailed {
        /// Todo that was being renamed
        id: TodoId,
        /// Why it failed
        error: TodoError,
    },

    /// Event: The repository deleted a todo
    DeleteConfirmed {
        /// Deleted todo
        id: TodoId,
    },

    /// Event: A delete failed; the list is reloaded to resynchronize
    DeleteFailed {
        /// Todo that was being deleted
        id: TodoId,
        /// Why it failed
        error: TodoError,
    },

    /// Event: The reload after a failed delete failed as well
    ResyncFailed {
        /// Why the reload failed
        error: TodoError,
    },
}

impl TodoAction {
    /// Whether this action is a command (as opposed to a result event)
    #[must_use]
    pub const fn is_command(&self) -> bool {
        matches!(
            self,
            Self::Refresh
                | Self::Create { .. }
                | Self::ToggleCompletion { .. }
                | Self::Rename { .. }
                | Self::Delete { .. }
        )
    }
}

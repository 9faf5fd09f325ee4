//! # Todos
//!
//! An in-memory, per-session cache of the signed-in user's todos, kept in
//! sync with a remote repository.
//!
//! ## Features
//!
//! - **Optimistic**: toggles and deletes show up before the remote call
//!   resolves, and are rolled back if it fails
//! - **Injected collaborators**: the session and the repository are traits,
//!   implemented by the hosted backend client or by [`mocks`]
//! - **Testable**: the logic is a reducer, checked without any I/O
//!
//! ## Architecture
//!
//! ```text
//! TodoStore::toggle_completion
//!   → ToggleCompletion   (reducer flips the flag, returns the remote call)
//!   → set_completed      (effect, awaited by the caller)
//!   → CompletionConfirmed | ToggleFailed (reducer reverts on failure)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use todos::TodoStore;
//!
//! let store = TodoStore::new(session, repository);
//! store.refresh().await?;
//!
//! let todo = store.create("buy milk").await?;
//! store.toggle_completion(todo.id, todo.completed).await?;
//! ```

pub mod actions;
pub mod environment;
pub mod error;
pub mod providers;
pub mod reducer;
pub mod state;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use actions::TodoAction;
pub use environment::TodoEnvironment;
pub use error::{Result, TodoError};
pub use providers::{SessionProvider, TodoRepository};
pub use reducer::TodoReducer;
pub use state::{NewTodo, Todo, TodoCounts, TodoFilter, TodoId, TodoState, User, UserId};
pub use store::TodoStore;

//! Remote todo repository trait.

use crate::error::Result;
use crate::state::{NewTodo, Todo, TodoId, UserId};

/// Networked CRUD endpoint for the `todos` relation.
///
/// Row-level access control is the repository's job: a caller can only see
/// and change rows it owns, and the store does not check ownership itself.
///
/// # Implementation Notes
///
/// - `list` returns rows newest first
/// - Ids and timestamps are assigned by the repository
/// - Updating or deleting an id the caller cannot see is not an error
///   unless the repository reports one
pub trait TodoRepository: Clone + Send + Sync + 'static {
    /// All todos owned by `owner`, ordered by `created_at` descending.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the repository rejects it.
    fn list(&self, owner: UserId) -> impl std::future::Future<Output = Result<Vec<Todo>>> + Send;

    /// Insert a todo and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the repository rejects it.
    fn insert(&self, todo: NewTodo) -> impl std::future::Future<Output = Result<Todo>> + Send;

    /// Set the completion flag of one todo.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the repository rejects it.
    fn set_completed(
        &self,
        id: TodoId,
        completed: bool,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Replace the text of one todo and return the updated row.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the repository rejects it, or
    /// no visible row has this id.
    fn update_text(
        &self,
        id: TodoId,
        text: String,
    ) -> impl std::future::Future<Output = Result<Todo>> + Send;

    /// Delete one todo.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the repository rejects it.
    fn delete(&self, id: TodoId) -> impl std::future::Future<Output = Result<()>> + Send;
}

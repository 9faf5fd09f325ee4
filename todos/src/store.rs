//! The todo store: a typed facade over the runtime [`Store`].
//!
//! Each operation sends one command and waits for the remote round trip to
//! finish, then reports the outcome both as its return value and, on
//! failure, in [`TodoState::last_error`].

use crate::actions::TodoAction;
use crate::environment::TodoEnvironment;
use crate::error::{Result, TodoError};
use crate::providers::{SessionProvider, TodoRepository};
use crate::reducer::TodoReducer;
use crate::state::{Todo, TodoCounts, TodoFilter, TodoId, TodoState};
use std::sync::Arc;
use todo_sync_runtime::Store;
use tokio::sync::broadcast;

/// Reported when a command's effects produced no result event.
const NO_RESPONSE: &str = "No response from repository";

/// Per-session cache of the principal's todos.
///
/// Cloning is cheap and every clone shares the same state. Operations may
/// be called concurrently; they interleave at remote calls, and overlapping
/// operations on the same id have no defined final order.
pub struct TodoStore<S, R>
where
    S: SessionProvider,
    R: TodoRepository,
{
    store: Arc<Store<TodoState, TodoAction, TodoEnvironment<S, R>, TodoReducer<S, R>>>,
}

impl<S, R> Clone for TodoStore<S, R>
where
    S: SessionProvider,
    R: TodoRepository,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S, R> TodoStore<S, R>
where
    S: SessionProvider,
    R: TodoRepository,
{
    /// An empty store; call [`TodoStore::refresh`] to load.
    #[must_use]
    pub fn new(session: S, repository: R) -> Self {
        Self::with_state(TodoState::new(), TodoEnvironment::new(session, repository))
    }

    /// A store starting from `state`.
    #[must_use]
    pub fn with_state(state: TodoState, environment: TodoEnvironment<S, R>) -> Self {
        Self {
            store: Arc::new(Store::new(state, TodoReducer::new(), environment)),
        }
    }

    /// Reload every todo of the current principal, replacing the cache.
    ///
    /// # Errors
    ///
    /// - [`TodoError::Unauthenticated`] if there is no session
    /// - [`TodoError::Repository`] if the fetch fails; the cache is left as it was
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        let produced = self.store.send(TodoAction::Refresh).await;
        settle(produced, |action| match action {
            TodoAction::TodosLoaded { .. } => Some(Ok(())),
            TodoAction::RefreshFailed { error } => Some(Err(error)),
            _ => None,
        })
    }

    /// Create a todo and put it at the head of the cache.
    ///
    /// Nothing is cached until the repository has stored the row.
    ///
    /// # Errors
    ///
    /// - [`TodoError::Validation`] if `text` is blank; no remote call is made
    /// - [`TodoError::Unauthenticated`] if there is no session
    /// - [`TodoError::Repository`] if the insert fails
    #[tracing::instrument(skip(self, text))]
    pub async fn create(&self, text: impl Into<String> + Send) -> Result<Todo> {
        let produced = self
            .store
            .send(TodoAction::Create { text: text.into() })
            .await;
        settle(produced, |action| match action {
            TodoAction::TodoCreated { todo } => Some(Ok(todo)),
            TodoAction::CreateFailed { error } => Some(Err(error)),
            _ => None,
        })
    }

    /// Flip the completion flag of `id` from `current`.
    ///
    /// The cached entry changes before the remote call and is reverted if
    /// the call fails.
    ///
    /// # Errors
    ///
    /// [`TodoError::Repository`] if the update fails.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_completion(&self, id: TodoId, current: bool) -> Result<()> {
        let produced = self
            .store
            .send(TodoAction::ToggleCompletion { id, current })
            .await;
        settle(produced, |action| match action {
            TodoAction::CompletionConfirmed { .. } => Some(Ok(())),
            TodoAction::ToggleFailed { error, .. } => Some(Err(error)),
            _ => None,
        })
    }

    /// Replace the text of `id`, then cache the row the repository returns.
    ///
    /// # Errors
    ///
    /// - [`TodoError::Validation`] if `text` is blank; no remote call is made
    /// - [`TodoError::Repository`] if the update fails
    #[tracing::instrument(skip(self, text))]
    pub async fn rename(&self, id: TodoId, text: impl Into<String> + Send) -> Result<Todo> {
        let produced = self
            .store
            .send(TodoAction::Rename {
                id,
                text: text.into(),
            })
            .await;
        settle(produced, |action| match action {
            TodoAction::TodoRenamed { todo } => Some(Ok(todo)),
            TodoAction::RenameFailed { error, .. } => Some(Err(error)),
            _ => None,
        })
    }

    /// Delete `id`.
    ///
    /// The entry leaves the cache before the remote call. If the call
    /// fails, the whole list is reloaded before this returns.
    ///
    /// # Errors
    ///
    /// [`TodoError::Repository`] if the delete fails.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: TodoId) -> Result<()> {
        let produced = self.store.send(TodoAction::Delete { id }).await;
        settle(produced, |action| match action {
            TodoAction::DeleteConfirmed { .. } => Some(Ok(())),
            TodoAction::DeleteFailed { error, .. } => Some(Err(error)),
            _ => None,
        })
    }

    /// Cached todos, newest first
    pub async fn items(&self) -> Vec<Todo> {
        self.store.state(|state| state.items.clone()).await
    }

    /// Message of the most recent failure
    pub async fn last_error(&self) -> Option<String> {
        self.store.state(|state| state.last_error.clone()).await
    }

    /// Whether a list fetch is in flight
    pub async fn is_loading(&self) -> bool {
        self.store.state(|state| state.is_loading).await
    }

    /// Copy of the whole state
    pub async fn snapshot(&self) -> TodoState {
        self.store.state(TodoState::clone).await
    }

    /// Cached todos passing `filter`
    pub async fn visible(&self, filter: TodoFilter) -> Vec<Todo> {
        self.store.state(|state| state.visible(filter)).await
    }

    /// Per-filter totals of the cache
    pub async fn counts(&self) -> TodoCounts {
        self.store.state(TodoState::counts).await
    }

    /// Observe every result event, for example to re-render a view.
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<TodoAction> {
        self.store.subscribe_actions()
    }
}

/// First outcome `pick` recognizes among the produced actions
fn settle<T>(
    produced: Vec<TodoAction>,
    pick: impl FnMut(TodoAction) -> Option<Result<T>>,
) -> Result<T> {
    produced
        .into_iter()
        .find_map(pick)
        .unwrap_or_else(|| Err(TodoError::Repository(NO_RESPONSE.to_string())))
}

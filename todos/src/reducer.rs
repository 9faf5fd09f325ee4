//! Reducer logic for the todo store.
//!
//! Commands clear `last_error`, apply their optimistic change (toggle and
//! delete only), and return a single effect that performs the remote call.
//! The effect resolves to a result event that confirms, replaces, or rolls
//! back the local change.

use crate::actions::TodoAction;
use crate::environment::TodoEnvironment;
use crate::error::{Result, TodoError};
use crate::providers::{SessionProvider, TodoRepository};
use crate::state::{NewTodo, Todo, TodoId, TodoState};
use std::marker::PhantomData;
use todo_sync_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};

const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Message recorded when a create or rename is given blank text.
pub const EMPTY_TEXT: &str = "Todo text cannot be empty";

/// Reducer for the todo store
pub struct TodoReducer<S, R> {
    _providers: PhantomData<fn() -> (S, R)>,
}

impl<S, R> TodoReducer<S, R>
where
    S: SessionProvider,
    R: TodoRepository,
{
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _providers: PhantomData,
        }
    }

    /// Load the principal's todos
    ///
    /// Succeeds with `TodosLoaded`; failures are wrapped by `on_failure` so
    /// a plain refresh and the resync after a failed delete can report
    /// differently.
    fn fetch(
        env: &TodoEnvironment<S, R>,
        on_failure: fn(TodoError) -> TodoAction,
    ) -> Effect<TodoAction> {
        let session = env.session.clone();
        let repository = env.repository.clone();

        Effect::Future(Box::pin(async move {
            Some(match load(&session, &repository).await {
                Ok(todos) => TodoAction::TodosLoaded { todos },
                Err(error) => on_failure(error),
            })
        }))
    }

    fn insert(env: &TodoEnvironment<S, R>, text: String) -> Effect<TodoAction> {
        let session = env.session.clone();
        let repository = env.repository.clone();

        Effect::Future(Box::pin(async move {
            Some(match create(&session, &repository, text).await {
                Ok(todo) => TodoAction::TodoCreated { todo },
                Err(error) => TodoAction::CreateFailed { error },
            })
        }))
    }

    fn set_completed(
        env: &TodoEnvironment<S, R>,
        id: TodoId,
        previous: bool,
    ) -> Effect<TodoAction> {
        let repository = env.repository.clone();
        let completed = !previous;

        Effect::Future(Box::pin(async move {
            Some(match repository.set_completed(id, completed).await {
                Ok(()) => TodoAction::CompletionConfirmed { id, completed },
                Err(error) => TodoAction::ToggleFailed {
                    id,
                    previous,
                    error,
                },
            })
        }))
    }

    fn update_text(env: &TodoEnvironment<S, R>, id: TodoId, text: String) -> Effect<TodoAction> {
        let repository = env.repository.clone();

        Effect::Future(Box::pin(async move {
            Some(match repository.update_text(id, text).await {
                Ok(todo) => TodoAction::TodoRenamed { todo },
                Err(error) => TodoAction::RenameFailed { id, error },
            })
        }))
    }

    fn delete(env: &TodoEnvironment<S, R>, id: TodoId) -> Effect<TodoAction> {
        let repository = env.repository.clone();

        Effect::Future(Box::pin(async move {
            Some(match repository.delete(id).await {
                Ok(()) => TodoAction::DeleteConfirmed { id },
                Err(error) => TodoAction::DeleteFailed { id, error },
            })
        }))
    }

    /// Trimmed text, or `None` if nothing is left
    ///
    /// The byte order mark counts as whitespace here.
    fn normalize(text: &str) -> Option<String> {
        let text = text.trim_matches(|c: char| c.is_whitespace() || c == BYTE_ORDER_MARK);
        (!text.is_empty()).then(|| text.to_string())
    }
}

impl<S, R> Default for TodoReducer<S, R>
where
    S: SessionProvider,
    R: TodoRepository,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, R> Clone for TodoReducer<S, R> {
    fn clone(&self) -> Self {
        Self {
            _providers: PhantomData,
        }
    }
}

impl<S, R> std::fmt::Debug for TodoReducer<S, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TodoReducer")
    }
}

async fn load<S, R>(session: &S, repository: &R) -> Result<Vec<Todo>>
where
    S: SessionProvider,
    R: TodoRepository,
{
    let user = session
        .current_user()
        .await?
        .ok_or(TodoError::Unauthenticated)?;
    repository.list(user.id).await
}

async fn create<S, R>(session: &S, repository: &R, text: String) -> Result<Todo>
where
    S: SessionProvider,
    R: TodoRepository,
{
    let user = session
        .current_user()
        .await?
        .ok_or(TodoError::Unauthenticated)?;
    repository.insert(NewTodo::new(user.id, text)).await
}

impl<S, R> Reducer for TodoReducer<S, R>
where
    S: SessionProvider,
    R: TodoRepository,
{
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment<S, R>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        if action.is_command() {
            state.last_error = None;
        }

        match action {
            // ========== Commands ==========
            TodoAction::Refresh => {
                state.is_loading = true;
                smallvec![Self::fetch(env, |error| TodoAction::RefreshFailed { error })]
            },

            TodoAction::Create { text } => match Self::normalize(&text) {
                Some(text) => smallvec![Self::insert(env, text)],
                None => smallvec![Effect::emit(TodoAction::CreateFailed {
                    error: TodoError::Validation(EMPTY_TEXT.to_string()),
                })],
            },

            TodoAction::ToggleCompletion { id, current } => {
                if let Some(todo) = state.get_mut(&id) {
                    todo.completed = !current;
                } else {
                    tracing::debug!(%id, "Toggling a todo that is not cached");
                }
                smallvec![Self::set_completed(env, id, current)]
            },

            TodoAction::Rename { id, text } => match Self::normalize(&text) {
                Some(text) => smallvec![Self::update_text(env, id, text)],
                None => smallvec![Effect::emit(TodoAction::RenameFailed {
                    id,
                    error: TodoError::Validation(EMPTY_TEXT.to_string()),
                })],
            },

            TodoAction::Delete { id } => {
                state.remove(&id);
                smallvec![Self::delete(env, id)]
            },

            // ========== Events ==========
            TodoAction::TodosLoaded { todos } => {
                tracing::debug!(count = todos.len(), "Todos loaded");
                state.replace_items(todos);
                state.is_loading = false;
                SmallVec::new()
            },

            TodoAction::RefreshFailed { error } => {
                tracing::warn!(%error, "Refresh failed");
                state.is_loading = false;
                state.last_error = Some(error.to_string());
                SmallVec::new()
            },

            TodoAction::TodoCreated { todo } => {
                state.prepend(todo);
                SmallVec::new()
            },

            TodoAction::CreateFailed { error } => {
                tracing::warn!(%error, "Create failed");
                state.last_error = Some(error.to_string());
                SmallVec::new()
            },

            TodoAction::CompletionConfirmed { .. } | TodoAction::DeleteConfirmed { .. } => {
                SmallVec::new()
            },

            TodoAction::ToggleFailed {
                id,
                previous,
                error,
            } => {
                tracing::warn!(%id, %error, "Toggle failed, reverting");
                if let Some(todo) = state.get_mut(&id) {
                    todo.completed = previous;
                }
                state.last_error = Some(error.to_string());
                SmallVec::new()
            },

            TodoAction::TodoRenamed { todo } => {
                let id = todo.id;
                if !state.replace(todo) {
                    tracing::debug!(%id, "Renamed todo is no longer cached");
                }
                SmallVec::new()
            },

            TodoAction::RenameFailed { id, error } => {
                tracing::warn!(%id, %error, "Rename failed");
                state.last_error = Some(error.to_string());
                SmallVec::new()
            },

            TodoAction::DeleteFailed { id, error } => {
                tracing::warn!(%id, %error, "Delete failed, reloading todos");
                state.last_error = Some(error.to_string());
                state.is_loading = true;
                smallvec![Self::fetch(env, |error| TodoAction::ResyncFailed { error })]
            },

            // The delete failure stays in last_error
            TodoAction::ResyncFailed { error } => {
                tracing::warn!(%error, "Reload after failed delete failed");
                state.is_loading = false;
                SmallVec::new()
            },
        }
    }
}

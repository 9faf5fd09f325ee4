//! In-memory todo repository for testing.

use crate::error::{Result, TodoError};
use crate::providers::TodoRepository;
use crate::state::{NewTodo, Todo, TodoId, UserId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use todo_sync_core::environment::{Clock, SystemClock};
use tokio::sync::Notify;

/// Repository operations, for failure injection and call counting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// [`TodoRepository::list`]
    List,
    /// [`TodoRepository::insert`]
    Insert,
    /// [`TodoRepository::set_completed`]
    SetCompleted,
    /// [`TodoRepository::update_text`]
    UpdateText,
    /// [`TodoRepository::delete`]
    Delete,
}

#[derive(Debug, Default)]
struct Inner {
    /// Most recently inserted first
    rows: Vec<Todo>,
    failures: HashMap<Operation, String>,
    gates: HashMap<Operation, Arc<Notify>>,
    calls: HashMap<Operation, usize>,
}

/// In-memory todo repository.
///
/// Behaves like the hosted table: ids and timestamps are assigned on
/// insert, updates of unknown ids succeed silently, and a text update that
/// matches no row is an error because it must return the row.
#[derive(Clone)]
pub struct InMemoryTodoRepository {
    inner: Arc<Mutex<Inner>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for InMemoryTodoRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTodoRepository")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl InMemoryTodoRepository {
    /// Create an empty repository stamped by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty repository stamped by `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            clock,
        }
    }

    /// Store `todos` as if they had been inserted earlier.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn seed(&self, todos: impl IntoIterator<Item = Todo>) -> Result<()> {
        let mut inner = lock(&self.inner)?;
        for todo in todos {
            inner.rows.retain(|row| row.id != todo.id);
            inner.rows.insert(0, todo);
        }
        Ok(())
    }

    /// Make every call of `operation` fail with `message` until [`Self::recover`].
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn fail(&self, operation: Operation, message: impl Into<String>) -> Result<()> {
        lock(&self.inner)?.failures.insert(operation, message.into());
        Ok(())
    }

    /// Stop injecting failures into `operation`.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn recover(&self, operation: Operation) -> Result<()> {
        lock(&self.inner)?.failures.remove(&operation);
        Ok(())
    }

    /// Hold calls of `operation` until the returned handle is notified.
    ///
    /// Each `notify_one` on the handle releases one pending call. A permit
    /// given before the call arrives is kept, so the order does not matter.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn hold(&self, operation: Operation) -> Result<Arc<Notify>> {
        let gate = Arc::new(Notify::new());
        lock(&self.inner)?
            .gates
            .insert(operation, Arc::clone(&gate));
        Ok(gate)
    }

    /// Number of calls made to `operation` so far.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn calls(&self, operation: Operation) -> Result<usize> {
        Ok(lock(&self.inner)?
            .calls
            .get(&operation)
            .copied()
            .unwrap_or_default())
    }

    /// Every stored row, most recently inserted first.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn rows(&self) -> Result<Vec<Todo>> {
        Ok(lock(&self.inner)?.rows.clone())
    }

    /// Count the call, wait at its gate, then report any injected failure.
    async fn enter(inner: &Mutex<Inner>, operation: Operation) -> Result<()> {
        let gate = {
            let mut guard = lock(inner)?;
            *guard.calls.entry(operation).or_default() += 1;
            guard.gates.get(&operation).cloned()
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }

        match lock(inner)?.failures.get(&operation) {
            Some(message) => Err(TodoError::Repository(message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryTodoRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn lock(inner: &Mutex<Inner>) -> Result<MutexGuard<'_, Inner>> {
    inner
        .lock()
        .map_err(|_| TodoError::Repository("Mutex lock failed".to_string()))
}

impl TodoRepository for InMemoryTodoRepository {
    fn list(&self, owner: UserId) -> impl Future<Output = Result<Vec<Todo>>> + Send {
        let inner = Arc::clone(&self.inner);

        async move {
            Self::enter(&inner, Operation::List).await?;

            let mut todos: Vec<Todo> = lock(&inner)?
                .rows
                .iter()
                .filter(|row| row.owner == owner)
                .cloned()
                .collect();
            // Stable: rows sharing a timestamp stay most recent first
            todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(todos)
        }
    }

    fn insert(&self, todo: NewTodo) -> impl Future<Output = Result<Todo>> + Send {
        let inner = Arc::clone(&self.inner);
        let clock = Arc::clone(&self.clock);

        async move {
            Self::enter(&inner, Operation::Insert).await?;

            let now = clock.now();
            let row = Todo {
                id: TodoId::new(),
                owner: todo.owner,
                text: todo.text,
                completed: todo.completed,
                created_at: now,
                updated_at: now,
            };
            lock(&inner)?.rows.insert(0, row.clone());
            Ok(row)
        }
    }

    fn set_completed(&self, id: TodoId, completed: bool) -> impl Future<Output = Result<()>> + Send {
        let inner = Arc::clone(&self.inner);
        let clock = Arc::clone(&self.clock);

        async move {
            Self::enter(&inner, Operation::SetCompleted).await?;

            if let Some(row) = lock(&inner)?.rows.iter_mut().find(|row| row.id == id) {
                row.completed = completed;
                row.updated_at = clock.now();
            }
            Ok(())
        }
    }

    fn update_text(&self, id: TodoId, text: String) -> impl Future<Output = Result<Todo>> + Send {
        let inner = Arc::clone(&self.inner);
        let clock = Arc::clone(&self.clock);

        async move {
            Self::enter(&inner, Operation::UpdateText).await?;

            let mut guard = lock(&inner)?;
            let row = guard
                .rows
                .iter_mut()
                .find(|row| row.id == id)
                .ok_or_else(|| {
                    TodoError::Repository(
                        "JSON object requested, multiple (or no) rows returned".to_string(),
                    )
                })?;
            row.text = text;
            row.updated_at = clock.now();
            Ok(row.clone())
        }
    }

    fn delete(&self, id: TodoId) -> impl Future<Output = Result<()>> + Send {
        let inner = Arc::clone(&self.inner);

        async move {
            Self::enter(&inner, Operation::Delete).await?;

            lock(&inner)?.rows.retain(|row| row.id != id);
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use todo_sync_testing::stepping_clock;

    fn repository() -> InMemoryTodoRepository {
        InMemoryTodoRepository::with_clock(Arc::new(stepping_clock()))
    }

    #[tokio::test]
    async fn list_is_scoped_to_owner_and_newest_first() {
        let repo = repository();
        let alice = UserId::new();
        let bob = UserId::new();

        repo.insert(NewTodo::new(alice, "first")).await.unwrap();
        repo.insert(NewTodo::new(bob, "not mine")).await.unwrap();
        repo.insert(NewTodo::new(alice, "second")).await.unwrap();

        let texts: Vec<String> = repo
            .list(alice)
            .await
            .unwrap()
            .into_iter()
            .map(|todo| todo.text)
            .collect();
        assert_eq!(texts, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn injected_failures_apply_until_recovered() {
        let repo = repository();
        repo.fail(Operation::List, "boom").unwrap();

        let error = repo.list(UserId::new()).await.unwrap_err();
        assert_eq!(error, TodoError::Repository("boom".to_string()));

        repo.recover(Operation::List).unwrap();
        assert!(repo.list(UserId::new()).await.unwrap().is_empty());
        assert_eq!(repo.calls(Operation::List).unwrap(), 2);
    }

    #[tokio::test]
    async fn update_text_of_missing_row_is_an_error() {
        let repo = repository();
        let result = repo.update_text(TodoId::new(), "x".to_string()).await;
        assert!(matches!(result, Err(TodoError::Repository(_))));
    }

    #[tokio::test]
    async fn set_completed_on_missing_row_succeeds() {
        let repo = repository();
        repo.set_completed(TodoId::new(), true).await.unwrap();
        assert!(repo.rows().unwrap().is_empty());
    }

    #[tokio::test]
    async fn held_call_waits_for_permit() {
        let repo = repository();
        let owner = UserId::new();
        let gate = repo.hold(Operation::Insert).unwrap();

        let pending = tokio::spawn({
            let repo = repo.clone();
            async move { repo.insert(NewTodo::new(owner, "held")).await }
        });
        tokio::task::yield_now().await;
        assert!(repo.rows().unwrap().is_empty());

        gate.notify_one();
        let todo = pending.await.unwrap().unwrap();
        assert_eq!(repo.rows().unwrap(), vec![todo]);
    }
}

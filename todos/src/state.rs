//! Domain types and the todo store state.
//!
//! Field names follow the Rust side of the model; `serde` renames map them to
//! the column names of the remote `todos` relation (`user_id`,
//! `is_completed`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Unique identifier for a todo, assigned by the remote repository.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(Uuid);

impl TodoId {
    /// Creates a new random `TodoId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a `TodoId` from a UUID
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an authenticated principal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a `UserId` from a UUID
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The authenticated principal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Principal identifier
    pub id: UserId,
    /// Email address, when the auth provider reports one
    #[serde(default)]
    pub email: Option<String>,
}

/// A single todo, as stored by the remote repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Repository-assigned identifier
    pub id: TodoId,
    /// Creator of the todo
    #[serde(rename = "user_id")]
    pub owner: UserId,
    /// Human-readable text
    pub text: String,
    /// Completion flag
    #[serde(rename = "is_completed")]
    pub completed: bool,
    /// Assigned by the repository at creation
    pub created_at: DateTime<Utc>,
    /// Assigned by the repository on every modification
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a new todo.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodo {
    /// Todo text, already trimmed
    pub text: String,
    /// Owning principal
    #[serde(rename = "user_id")]
    pub owner: UserId,
    /// Always `false` for todos created by the store
    #[serde(rename = "is_completed")]
    pub completed: bool,
}

impl NewTodo {
    /// An incomplete todo owned by `owner`
    #[must_use]
    pub fn new(owner: UserId, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            owner,
            completed: false,
        }
    }
}

/// Which todos a listing shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoFilter {
    /// Every todo
    #[default]
    All,
    /// Todos not yet completed
    Active,
    /// Completed todos
    Completed,
}

impl TodoFilter {
    /// Whether `todo` passes this filter
    #[must_use]
    pub const fn matches(self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Active => !todo.completed,
            Self::Completed => todo.completed,
        }
    }
}

/// Per-filter totals for a todo list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoCounts {
    /// Number of todos
    pub all: usize,
    /// Number of incomplete todos
    pub active: usize,
    /// Number of completed todos
    pub completed: usize,
}

/// State of one todo store.
///
/// `items` is kept newest first and never holds two entries with the same
/// id. It is a cache of the remote repository and may briefly disagree
/// with it while an optimistic update is in flight.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TodoState {
    /// Cached todos, ordered by `created_at` descending
    pub items: Vec<Todo>,
    /// Whether a list fetch is in flight
    pub is_loading: bool,
    /// Message of the most recent failure, cleared when a command starts
    pub last_error: Option<String>,
}

impl TodoState {
    /// Creates a new empty todo state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// State holding `items`, sorted and de-duplicated
    #[must_use]
    pub fn with_items(items: Vec<Todo>) -> Self {
        let mut state = Self::new();
        state.replace_items(items);
        state
    }

    /// Returns a todo by ID
    #[must_use]
    pub fn get(&self, id: &TodoId) -> Option<&Todo> {
        self.items.iter().find(|todo| todo.id == *id)
    }

    /// Mutable access to a todo by ID
    pub fn get_mut(&mut self, id: &TodoId) -> Option<&mut Todo> {
        self.items.iter_mut().find(|todo| todo.id == *id)
    }

    /// Checks if a todo exists
    #[must_use]
    pub fn contains(&self, id: &TodoId) -> bool {
        self.get(id).is_some()
    }

    /// Replace the whole collection
    ///
    /// Sorts newest first. The sort is stable, so todos sharing a
    /// timestamp keep the order they were given in. Later duplicates of an
    /// id are dropped.
    pub fn replace_items(&mut self, mut items: Vec<Todo>) {
        let mut seen = HashSet::with_capacity(items.len());
        items.retain(|todo| seen.insert(todo.id));
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.items = items;
    }

    /// Put `todo` at the head, replacing any entry with the same id
    pub fn prepend(&mut self, todo: Todo) {
        self.remove(&todo.id);
        self.items.insert(0, todo);
    }

    /// Swap in `todo` for the entry with the same id
    ///
    /// Returns `false`, leaving the collection alone, if no entry matches.
    pub fn replace(&mut self, todo: Todo) -> bool {
        match self.get_mut(&todo.id) {
            Some(entry) => {
                *entry = todo;
                true
            },
            None => false,
        }
    }

    /// Remove the entry with `id`, returning it
    pub fn remove(&mut self, id: &TodoId) -> Option<Todo> {
        let index = self.items.iter().position(|todo| todo.id == *id)?;
        Some(self.items.remove(index))
    }

    /// Todos passing `filter`, in collection order
    #[must_use]
    pub fn visible(&self, filter: TodoFilter) -> Vec<Todo> {
        self.items
            .iter()
            .filter(|todo| filter.matches(todo))
            .cloned()
            .collect()
    }

    /// Per-filter totals
    #[must_use]
    pub fn counts(&self) -> TodoCounts {
        let completed = self.items.iter().filter(|todo| todo.completed).count();
        TodoCounts {
            all: self.items.len(),
            active: self.items.len() - completed,
            completed,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn todo_at(seconds: i64, text: &str) -> Todo {
        let at = Utc.timestamp_opt(1_735_689_600 + seconds, 0).unwrap();
        Todo {
            id: TodoId::new(),
            owner: UserId::from_uuid(Uuid::nil()),
            text: text.to_string(),
            completed: false,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn todo_uses_column_names_on_the_wire() {
        let todo = todo_at(0, "buy milk");
        let json = serde_json::to_value(&todo).unwrap();

        assert_eq!(json["text"], "buy milk");
        assert_eq!(json["is_completed"], false);
        assert_eq!(json["user_id"], Uuid::nil().to_string());
        assert!(json.get("owner").is_none());

        let back: Todo = serde_json::from_value(json).unwrap();
        assert_eq!(back, todo);
    }

    #[test]
    fn new_todo_payload_is_incomplete() {
        let owner = UserId::new();
        let json = serde_json::to_value(NewTodo::new(owner, "walk dog")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "text": "walk dog",
                "user_id": owner.to_string(),
                "is_completed": false,
            })
        );
    }

    #[test]
    fn replace_items_sorts_newest_first_and_drops_duplicates() {
        let old = todo_at(0, "old");
        let new = todo_at(10, "new");
        let mut dup = old.clone();
        dup.text = "shadow".to_string();

        let state = TodoState::with_items(vec![old.clone(), new.clone(), dup]);

        assert_eq!(state.items.len(), 2);
        assert_eq!(state.items[0].id, new.id);
        assert_eq!(state.items[1].text, "old");
    }

    #[test]
    fn prepend_replaces_existing_entry() {
        let a = todo_at(0, "a");
        let b = todo_at(1, "b");
        let mut state = TodoState::with_items(vec![a.clone(), b.clone()]);

        let mut a2 = a.clone();
        a2.text = "a again".to_string();
        state.prepend(a2);

        assert_eq!(state.items.len(), 2);
        assert_eq!(state.items[0].text, "a again");
        assert_eq!(state.items[1].id, b.id);
    }

    #[test]
    fn replace_ignores_unknown_id() {
        let mut state = TodoState::with_items(vec![todo_at(0, "a")]);
        assert!(!state.replace(todo_at(1, "stranger")));
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].text, "a");
    }

    #[test]
    fn filters_and_counts() {
        let mut done = todo_at(1, "done");
        done.completed = true;
        let state = TodoState::with_items(vec![todo_at(0, "open"), done]);

        assert_eq!(
            state.counts(),
            TodoCounts {
                all: 2,
                active: 1,
                completed: 1
            }
        );
        assert_eq!(state.visible(TodoFilter::Active)[0].text, "open");
        assert_eq!(state.visible(TodoFilter::Completed)[0].text, "done");
        assert_eq!(state.visible(TodoFilter::All).len(), 2);
    }

    #[test]
    fn filter_parses_lowercase_names() {
        let filter: TodoFilter = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(filter, TodoFilter::Completed);
        assert_eq!(TodoFilter::default(), TodoFilter::All);
    }
}

//! Environment for the todo reducer.

use crate::providers::{SessionProvider, TodoRepository};

/// Collaborators the todo reducer hands to its effects.
///
/// Effects run after the reducer returns, so each one takes its own clone
/// of the provider it needs.
#[derive(Clone, Debug)]
pub struct TodoEnvironment<S, R>
where
    S: SessionProvider,
    R: TodoRepository,
{
    /// Source of the current principal
    pub session: S,
    /// Remote store of record
    pub repository: R,
}

impl<S, R> TodoEnvironment<S, R>
where
    S: SessionProvider,
    R: TodoRepository,
{
    /// Creates a new `TodoEnvironment`
    #[must_use]
    pub const fn new(session: S, repository: R) -> Self {
        Self {
            session,
            repository,
        }
    }
}

//! In-memory provider implementations for testing.
//!
//! These stand in for the hosted backend in unit and integration tests,
//! with hooks for injecting failures and holding calls in flight.

pub mod repository;
pub mod session;

pub use repository::{InMemoryTodoRepository, Operation};
pub use session::MockSessionProvider;

//! Collaborator traits the todo store depends on.
//!
//! Implementations live elsewhere: the hosted backend client implements
//! both traits, and [`crate::mocks`] provides in-memory versions for tests.

pub mod repository;
pub mod session;

pub use repository::TodoRepository;
pub use session::SessionProvider;

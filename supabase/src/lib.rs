//! # Todo Sync Supabase
//!
//! Supabase backend for the todo store: a GoTrue auth client and a
//! PostgREST repository for the `todos` relation.
//!
//! ## Example
//!
//! ```rust,ignore
//! use todo_sync_supabase::{Credentials, SupabaseClient};
//! use todos::TodoStore;
//!
//! let client = SupabaseClient::from_env()?;
//! client
//!     .auth()
//!     .sign_in_with_password(&Credentials::new("ada@example.com", "secret"))
//!     .await?;
//!
//! // The client is the session provider; its repository runs as the same user
//! let store = TodoStore::new(client.clone(), client.todos());
//! store.refresh().await?;
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod pkce;
pub mod repository;
pub mod session;

pub use auth::{AuthError, Credentials, OAuthProvider, OAuthRedirect, SignUpOutcome, SupabaseAuth};
pub use client::{AuthSession, SessionTokens, SupabaseClient};
pub use config::SupabaseConfig;
pub use error::{Result, SupabaseError};
pub use repository::SupabaseTodoRepository;

//! # Todo Sync Web
//!
//! Axum server in front of the todo store and the Supabase backend.
//!
//! # Request Flow
//!
//! 1. **Route gate** redirects by session cookie presence
//! 2. **Handler** derives a Supabase client from the session cookies
//! 3. **Store** runs the operation against the backend
//! 4. **Response** is JSON, or an [`AppError`] mapped to a status code
//!
//! # Example
//!
//! ```ignore
//! use todo_sync_web::{app_router, AppState, ServerConfig};
//!
//! let config = ServerConfig::from_env()?;
//! let state = AppState::from_config(&config)?;
//! let listener = tokio::net::TcpListener::bind(config.addr()).await?;
//! axum::serve(listener, app_router(state)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod cookies;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod router;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use error::AppError;
pub use gate::{route_gate, GateDecision};
pub use router::app_router;
pub use state::{AppState, RequestSession};

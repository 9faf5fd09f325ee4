//! Application state for Axum handlers.

use crate::config::ServerConfig;
use crate::cookies;
use crate::error::AppError;
use axum::http::{header, HeaderMap};
use axum::response::{AppendHeaders, IntoResponse, Response};
use todo_sync_supabase::{SupabaseClient, SupabaseTodoRepository};
use todos::TodoStore;

/// Todo store bound to one request's session
pub type RequestTodoStore = TodoStore<SupabaseClient, SupabaseTodoRepository>;

/// Application state shared across all HTTP handlers.
///
/// Holds a signed-out base client. Handlers never use it directly; each
/// request derives its own client carrying the caller's cookies.
#[derive(Clone, Debug)]
pub struct AppState {
    supabase: SupabaseClient,
    secure_cookies: bool,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub const fn new(supabase: SupabaseClient, secure_cookies: bool) -> Self {
        Self {
            supabase,
            secure_cookies,
        }
    }

    /// State for `config`.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn from_config(config: &ServerConfig) -> todo_sync_supabase::Result<Self> {
        let supabase = SupabaseClient::new(config.supabase.clone())?;
        Ok(Self::new(supabase, config.secure_cookies()))
    }

    /// Whether cookies are marked `Secure`
    #[must_use]
    pub const fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    /// A fresh client for flows that establish a session
    #[must_use]
    pub fn signed_out_client(&self) -> SupabaseClient {
        self.supabase.new_session()
    }

    /// A client authenticated with the request's session cookies, if any
    #[must_use]
    pub fn client_for(&self, headers: &HeaderMap) -> SupabaseClient {
        self.session_for(headers).client
    }

    /// The request's session, restored from its cookies
    #[must_use]
    pub fn session_for(&self, headers: &HeaderMap) -> RequestSession {
        let client = self.signed_out_client();
        let tokens = cookies::session_tokens(headers);
        let restored = tokens.is_some();
        if let Some(tokens) = tokens {
            client.restore_session(tokens);
        }
        RequestSession {
            client,
            restored,
            secure_cookies: self.secure_cookies,
        }
    }
}

/// One request's Supabase session.
///
/// The backend may renew or end the session while the request runs;
/// [`RequestSession::respond`] carries that back to the browser.
#[derive(Clone, Debug)]
pub struct RequestSession {
    client: SupabaseClient,
    restored: bool,
    secure_cookies: bool,
}

impl RequestSession {
    /// Client carrying the session
    #[must_use]
    pub const fn client(&self) -> &SupabaseClient {
        &self.client
    }

    /// A todo store running as the request's user
    #[must_use]
    pub fn todo_store(&self) -> RequestTodoStore {
        TodoStore::new(self.client.clone(), self.client.todos())
    }

    /// `Set-Cookie` values bringing the browser's session cookies up to date
    ///
    /// A renewed session is stored; a session the backend ended is cleared.
    #[must_use]
    pub fn cookie_updates(&self) -> Vec<String> {
        if let Some(session) = self.client.issued_session() {
            tracing::debug!(user_id = %session.user.id, "Storing renewed session");
            return cookies::store_session(&session, self.secure_cookies).into();
        }
        if self.restored && self.client.tokens().is_none() {
            tracing::debug!("Session ended, clearing cookies");
            return cookies::clear_session(self.secure_cookies).into();
        }
        Vec::new()
    }

    /// `result` as a response, with any session cookie updates attached
    pub fn respond<T: IntoResponse>(&self, result: Result<T, AppError>) -> Response {
        let updates: Vec<_> = self
            .cookie_updates()
            .into_iter()
            .map(|cookie| (header::SET_COOKIE, cookie))
            .collect();
        (AppendHeaders(updates), result).into_response()
    }
}

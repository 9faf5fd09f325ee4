//! Supabase client implementation

use crate::auth::SupabaseAuth;
use crate::config::SupabaseConfig;
use crate::error::{Result, SupabaseError};
use crate::repository::SupabaseTodoRepository;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;
use todos::User;

/// A signed-in session as returned by the auth API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// JWT sent as the bearer token
    pub access_token: String,
    /// Token for obtaining a new access token
    pub refresh_token: String,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
    /// Expiry of the access token as a Unix timestamp
    #[serde(default)]
    pub expires_at: Option<i64>,
    /// Usually `bearer`
    pub token_type: String,
    /// The signed-in user
    pub user: User,
}

/// Tokens the client authenticates requests with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionTokens {
    /// JWT sent as the bearer token
    pub access_token: String,
    /// Token for obtaining a new access token, if known
    pub refresh_token: Option<String>,
}

impl From<&AuthSession> for SessionTokens {
    fn from(session: &AuthSession) -> Self {
        Self {
            access_token: session.access_token.clone(),
            refresh_token: Some(session.refresh_token.clone()),
        }
    }
}

/// Supabase client
///
/// Constructed explicitly and cloned into whatever needs it; clones share
/// the session. Every request carries the project's anon key as `apikey`
/// and, as bearer token, the session's access token when there is one or
/// the anon key otherwise.
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    config: Arc<SupabaseConfig>,
    tokens: Arc<RwLock<Option<SessionTokens>>>,
    issued: Arc<RwLock<Option<AuthSession>>>,
    user: Arc<watch::Sender<Option<User>>>,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("url", &self.config.url)
            .field("signed_in", &self.tokens().is_some())
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    /// Create a client without a session
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::RequestFailed` if the HTTP client cannot be built
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SupabaseError::RequestFailed(e.to_string()))?;

        Ok(Self::signed_out(http, Arc::new(config)))
    }

    fn signed_out(http: Client, config: Arc<SupabaseConfig>) -> Self {
        let (user, _) = watch::channel(None);
        Self {
            http,
            config,
            tokens: Arc::new(RwLock::new(None)),
            issued: Arc::new(RwLock::new(None)),
            user: Arc::new(user),
        }
    }

    /// Create a client with configuration from environment
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::MissingConfig` if `SUPABASE_URL` or
    /// `SUPABASE_ANON_KEY` is not set
    pub fn from_env() -> Result<Self> {
        Self::new(SupabaseConfig::from_env()?)
    }

    /// A signed-out client sharing this one's connection pool and config.
    ///
    /// Servers keep one base client and derive a client per request, so
    /// concurrent callers never see each other's session.
    #[must_use]
    pub fn new_session(&self) -> Self {
        Self::signed_out(self.http.clone(), Arc::clone(&self.config))
    }

    /// Project configuration
    #[must_use]
    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    /// Auth flows bound to this client
    #[must_use]
    pub fn auth(&self) -> SupabaseAuth {
        SupabaseAuth::new(self.clone())
    }

    /// The `todos` relation, accessed with this client's session
    #[must_use]
    pub fn todos(&self) -> SupabaseTodoRepository {
        SupabaseTodoRepository::new(self.clone())
    }

    /// Current tokens, if signed in
    #[must_use]
    pub fn tokens(&self) -> Option<SessionTokens> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Authenticate later requests with previously issued tokens.
    ///
    /// The user is not known until [`todos::SessionProvider::current_user`]
    /// checks the access token with the auth API.
    pub fn restore_session(&self, tokens: SessionTokens) {
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) = Some(tokens);
        *self.issued.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Adopt a session returned by the auth API
    pub fn set_session(&self, session: &AuthSession) {
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) =
            Some(SessionTokens::from(session));
        *self.issued.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        self.publish_user(Some(session.user.clone()));
    }

    /// Forget the local session
    pub fn clear_session(&self) {
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) = None;
        *self.issued.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.publish_user(None);
    }

    /// The last session the auth API issued to this client, if it is still
    /// current.
    ///
    /// Set by sign-in, code exchange and refresh; restored tokens don't
    /// count. Callers that persist sessions use it to notice a refresh.
    #[must_use]
    pub fn issued_session(&self) -> Option<AuthSession> {
        self.issued
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Trade the stored refresh token for a new session.
    ///
    /// Returns `Ok(None)` when there is no refresh token, or when the auth
    /// API rejects it; the local session is cleared in that case.
    ///
    /// # Errors
    ///
    /// Network failures and server errors; the session is kept so a later
    /// call can retry.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_session(&self) -> Result<Option<AuthSession>> {
        let Some(refresh_token) = self.tokens().and_then(|tokens| tokens.refresh_token) else {
            return Ok(None);
        };

        let request = self
            .request(Method::POST, &self.config.auth_url("token"))
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }));

        match Self::send_json::<AuthSession>(request).await {
            Ok(session) => {
                self.set_session(&session);
                tracing::info!(user_id = %session.user.id, "Session refreshed");
                Ok(Some(session))
            },
            Err(
                error @ (SupabaseError::Unauthorized(_)
                | SupabaseError::ApiError {
                    status: 400..=499,
                    ..
                }),
            ) => {
                tracing::info!(%error, "Refresh token rejected, clearing session");
                self.clear_session();
                Ok(None)
            },
            Err(error) => Err(error),
        }
    }

    /// Observe the signed-in user
    #[must_use]
    pub fn subscribe_user(&self) -> watch::Receiver<Option<User>> {
        self.user.subscribe()
    }

    /// Notify subscribers only when the user actually changes
    pub(crate) fn publish_user(&self, user: Option<User>) {
        self.user.send_if_modified(|current| {
            if *current == user {
                false
            } else {
                *current = user;
                true
            }
        });
    }

    /// Start a request with the `apikey` and bearer headers set
    pub(crate) fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let bearer = self
            .tokens()
            .map_or_else(|| self.config.anon_key.clone(), |tokens| tokens.access_token);

        self.http
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
    }

    /// Send a request and decode a JSON body
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
        let response = Self::send_checked(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| SupabaseError::ResponseParseFailed(e.to_string()))
    }

    /// Send a request and ignore any body
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or API errors
    pub(crate) async fn send_empty(request: RequestBuilder) -> Result<()> {
        Self::send_checked(request).await.map(drop)
    }

    /// Send a request built by `build` with the current session.
    ///
    /// If the access token is rejected and a refresh token is stored, the
    /// session is refreshed and the request rebuilt and sent once more. A
    /// token that stays rejected ends the session.
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or API errors
    pub(crate) async fn send_authorized<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(&Self) -> RequestBuilder + Send,
    {
        let error = match Self::send_checked(build(self)).await {
            Err(SupabaseError::Unauthorized(message)) => SupabaseError::Unauthorized(message),
            other => return other,
        };

        if self.refresh_session().await?.is_some() {
            return Self::send_checked(build(self)).await;
        }
        tracing::info!(%error, "Access token rejected, clearing session");
        self.clear_session();
        Err(error)
    }

    /// [`SupabaseClient::send_authorized`], decoding a JSON body
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub(crate) async fn send_authorized_json<T, F>(&self, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn(&Self) -> RequestBuilder + Send,
    {
        self.send_authorized(build)
            .await?
            .json::<T>()
            .await
            .map_err(|e| SupabaseError::ResponseParseFailed(e.to_string()))
    }

    async fn send_checked(request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, "Supabase request failed");
            SupabaseError::RequestFailed(e.to_string())
        })?;

        let status = response.status();
        tracing::debug!(%status, url = %response.url().path(), "Supabase response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = SupabaseError::from_response(status.as_u16(), &body);
        if status == StatusCode::UNAUTHORIZED {
            tracing::debug!(%error, "Supabase rejected the access token");
        } else {
            tracing::warn!(%error, "Supabase returned an error");
        }
        Err(error)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use todos::UserId;

    fn session() -> AuthSession {
        AuthSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_in: 3600,
            expires_at: None,
            token_type: "bearer".to_string(),
            user: User {
                id: UserId::new(),
                email: Some("ada@example.com".to_string()),
            },
        }
    }

    #[test]
    fn session_changes_are_published_once() {
        let client = SupabaseClient::new(SupabaseConfig::new("http://localhost", "anon")).unwrap();
        let mut users = client.subscribe_user();
        let session = session();

        client.set_session(&session);
        assert!(users.has_changed().unwrap());
        assert_eq!(users.borrow_and_update().as_ref(), Some(&session.user));

        client.set_session(&session);
        assert!(!users.has_changed().unwrap());

        client.clear_session();
        assert!(users.has_changed().unwrap());
        assert!(client.tokens().is_none());
    }

    #[test]
    fn clones_share_tokens() {
        let client = SupabaseClient::new(SupabaseConfig::new("http://localhost", "anon")).unwrap();
        let clone = client.clone();

        client.restore_session(SessionTokens {
            access_token: "restored".to_string(),
            refresh_token: None,
        });

        assert_eq!(clone.tokens().unwrap().access_token, "restored");
    }

    #[test]
    fn new_session_starts_signed_out() {
        let client = SupabaseClient::new(SupabaseConfig::new("http://localhost", "anon")).unwrap();
        client.set_session(&session());

        let scoped = client.new_session();
        assert!(scoped.tokens().is_none());
        assert!(scoped.subscribe_user().borrow().is_none());

        scoped.restore_session(SessionTokens {
            access_token: "other".to_string(),
            refresh_token: None,
        });
        assert_eq!(client.tokens().unwrap().access_token, "access");
    }
}

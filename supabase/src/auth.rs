//! Auth flows against the GoTrue API.
//!
//! - Email and password sign-up and sign-in
//! - OAuth sign-in through the hosted authorize endpoint, using PKCE
//! - Sign-out
//!
//! Successful flows store the new session on the [`SupabaseClient`], so
//! later repository calls run as the signed-in user.

use crate::client::{AuthSession, SupabaseClient};
use crate::error::SupabaseError;
use crate::pkce::PkcePair;
use regex::Regex;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::LazyLock;
use thiserror::Error;
use todos::{User, UserId};

/// Shortest password accepted at sign-up
pub const MIN_PASSWORD_LEN: usize = 6;

/// Message GoTrue returns for a wrong email or password
const INVALID_LOGIN: &str = "Invalid login credentials";

#[allow(clippy::expect_used)] // Literal pattern
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email pattern"));

/// Errors from the auth flows.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Email is not of the form `local@domain.tld`
    #[error("Please enter a valid email address")]
    InvalidEmail,

    /// Password is too short
    #[error("Password must be at least {min} characters")]
    WeakPassword {
        /// Minimum length
        min: usize,
    },

    /// Wrong email or password
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// The auth API failed or rejected the request
    #[error("{}", .0.message())]
    Backend(#[from] SupabaseError),
}

/// Result type alias for auth flows.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Email and password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Credentials for `email` and `password`
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Check the shape of the email and the length of the password.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidEmail`] unless the email has a non-empty local
    ///   part, one `@`, a dot between domain labels, and no whitespace
    /// - [`AuthError::WeakPassword`] if the password is shorter than
    ///   [`MIN_PASSWORD_LEN`] characters
    pub fn validate(&self) -> Result<()> {
        if !looks_like_email(&self.email) {
            return Err(AuthError::InvalidEmail);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }
        Ok(())
    }
}

fn looks_like_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Outcome of a sign-up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// Email confirmation is off; the user is signed in
    SignedIn(AuthSession),
    /// A confirmation link was sent; the user must follow it before signing in
    ConfirmationRequired(User),
    /// The email already belongs to an account
    AlreadyRegistered,
}

/// OAuth identity providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    /// Google
    Google,
}

impl OAuthProvider {
    /// Provider name as the auth API spells it
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
        }
    }
}

/// Where to send the browser to start an OAuth sign-in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthRedirect {
    /// Authorize URL on the auth API
    pub url: String,
    /// PKCE verifier to keep until the callback
    pub code_verifier: String,
}

/// User object returned by sign-up when no session is issued
#[derive(Deserialize)]
struct SignedUpUser {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    identities: Option<Vec<serde_json::Value>>,
}

/// Auth API bound to one client
#[derive(Clone, Debug)]
pub struct SupabaseAuth {
    client: SupabaseClient,
}

impl SupabaseAuth {
    /// Auth flows for `client`
    #[must_use]
    pub const fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Register a new account.
    ///
    /// The confirmation email, if any, links back to the site's
    /// `/auth/callback`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidEmail`] / [`AuthError::WeakPassword`] before any request
    /// - [`AuthError::Backend`] if the auth API fails or rejects the sign-up
    #[tracing::instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome> {
        credentials.validate()?;

        let config = self.client.config();
        let request = self
            .client
            .request(Method::POST, &config.auth_url("signup"))
            .query(&[("redirect_to", config.callback_url())])
            .json(credentials);
        let body: serde_json::Value = SupabaseClient::send_json(request).await?;

        if body.get("access_token").is_some() {
            let session: AuthSession = serde_json::from_value(body)
                .map_err(|e| SupabaseError::ResponseParseFailed(e.to_string()))?;
            self.client.set_session(&session);
            tracing::info!(user_id = %session.user.id, "Signed up and signed in");
            return Ok(SignUpOutcome::SignedIn(session));
        }

        // Without a session, sign-up answers with the bare user
        let user: SignedUpUser = serde_json::from_value(body)
            .map_err(|e| SupabaseError::ResponseParseFailed(e.to_string()))?;
        if user.identities.as_ref().is_some_and(Vec::is_empty) {
            tracing::info!("Sign-up for an email that is already registered");
            return Ok(SignUpOutcome::AlreadyRegistered);
        }

        tracing::info!(user_id = %user.id, "Signed up, confirmation required");
        Ok(SignUpOutcome::ConfirmationRequired(User {
            id: user.id,
            email: user.email,
        }))
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCredentials`] for a wrong email or password
    /// - [`AuthError::Backend`] for any other failure
    #[tracing::instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<AuthSession> {
        let request = self
            .client
            .request(Method::POST, &self.client.config().auth_url("token"))
            .query(&[("grant_type", "password")])
            .json(credentials);

        let session: AuthSession = SupabaseClient::send_json(request)
            .await
            .map_err(|error| match error {
                SupabaseError::ApiError { status: 400, ref message } if message == INVALID_LOGIN => {
                    AuthError::InvalidCredentials
                },
                other => AuthError::Backend(other),
            })?;

        self.client.set_session(&session);
        tracing::info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    /// Authorize URL for an OAuth sign-in that returns to `redirect_to`.
    ///
    /// No request is made; the caller redirects the browser and keeps
    /// `code_verifier` for [`SupabaseAuth::exchange_code_for_session`].
    #[must_use]
    pub fn authorize_url(&self, provider: OAuthProvider, redirect_to: &str) -> OAuthRedirect {
        let pkce = PkcePair::generate();
        let query = serde_urlencoded::to_string([
            ("provider", provider.as_str()),
            ("redirect_to", redirect_to),
            ("code_challenge", pkce.challenge.as_str()),
            ("code_challenge_method", "s256"),
        ])
        .unwrap_or_default();

        OAuthRedirect {
            url: format!("{}?{query}", self.client.config().auth_url("authorize")),
            code_verifier: pkce.verifier,
        }
    }

    /// Trade the code from an OAuth callback for a session.
    ///
    /// # Errors
    ///
    /// [`AuthError::Backend`] if the code is invalid, expired, or does not
    /// match the verifier.
    #[tracing::instrument(skip_all)]
    pub async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<AuthSession> {
        let request = self
            .client
            .request(Method::POST, &self.client.config().auth_url("token"))
            .query(&[("grant_type", "pkce")])
            .json(&json!({ "auth_code": code, "code_verifier": code_verifier }));

        let session: AuthSession = SupabaseClient::send_json(request).await?;
        self.client.set_session(&session);
        tracing::info!(user_id = %session.user.id, "Signed in with OAuth");
        Ok(session)
    }

    /// Revoke the session and forget it locally.
    ///
    /// The local session is cleared even if revocation fails. A token the
    /// auth API no longer accepts counts as revoked.
    ///
    /// # Errors
    ///
    /// [`AuthError::Backend`] if the auth API could not be reached or
    /// refused to revoke the session.
    #[tracing::instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<()> {
        if self.client.tokens().is_none() {
            self.client.clear_session();
            return Ok(());
        }

        let request = self
            .client
            .request(Method::POST, &self.client.config().auth_url("logout"));
        let result = SupabaseClient::send_empty(request).await;
        self.client.clear_session();

        match result {
            Ok(()) | Err(SupabaseError::Unauthorized(_)) => Ok(()),
            Err(error) => {
                tracing::warn!(%error, "Session revocation failed");
                Err(AuthError::Backend(error))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        for valid in ["a@b.co", "first.last@example.com", "x+tag@sub.domain.org"] {
            assert!(looks_like_email(valid), "{valid}");
        }
        for invalid in [
            "",
            "plain",
            "@example.com",
            "user@",
            "user@example",
            "user@.com",
            "user@example.",
            "us er@example.com",
            "a@b@c.com",
        ] {
            assert!(!looks_like_email(invalid), "{invalid}");
        }
    }

    #[test]
    fn validate_checks_email_before_password() {
        assert_eq!(
            Credentials::new("nope", "x").validate(),
            Err(AuthError::InvalidEmail)
        );
        assert_eq!(
            Credentials::new("ada@example.com", "12345").validate(),
            Err(AuthError::WeakPassword { min: 6 })
        );
        assert_eq!(Credentials::new("ada@example.com", "123456").validate(), Ok(()));
    }

    #[test]
    fn credentials_debug_hides_password() {
        let debug = format!("{:?}", Credentials::new("ada@example.com", "hunter22"));
        assert!(debug.contains("ada@example.com"));
        assert!(!debug.contains("hunter22"));
    }

    #[test]
    fn backend_errors_show_remote_message() {
        let error = AuthError::from(SupabaseError::ApiError {
            status: 422,
            message: "Signups not allowed for this instance".to_string(),
        });
        assert_eq!(error.to_string(), "Signups not allowed for this instance");
        assert_eq!(
            AuthError::WeakPassword { min: 6 }.to_string(),
            "Password must be at least 6 characters"
        );
    }
}

//! Sign-up, sign-in, sign-out, and the Google OAuth round trip.
//!
//! Successful sign-ins answer with `Set-Cookie` headers holding the
//! session; see [`crate::cookies`].

use crate::cookies;
use crate::error::{AppError, ALREADY_REGISTERED};
use crate::gate::{LOGIN_PATH, TODOS_PATH};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use todo_sync_supabase::{Credentials, OAuthProvider, SignUpOutcome};
use todos::{SessionProvider, TodoError, User};

/// Shown when the callback arrives without the verifier cookie
pub const MISSING_VERIFIER: &str = "Sign-in expired. Please try again.";

/// Response to `POST /api/auth/signup`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignUpResponse {
    /// Session cookies are set
    SignedIn {
        /// The new user
        user: User,
    },
    /// The user must follow the emailed link first
    ConfirmationRequired {
        /// The new user
        user: User,
    },
}

/// Response to `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SignInResponse {
    /// The signed-in user
    pub user: User,
}

/// Response to `POST /api/auth/signout`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SignOutResponse {
    /// Always true; sign-out never fails from the caller's point of view
    pub success: bool,
}

/// Query of the OAuth callback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code to exchange
    pub code: Option<String>,
    /// Error code from the auth service
    pub error: Option<String>,
    /// Human-readable error from the auth service
    pub error_description: Option<String>,
}

fn set_cookies<I>(cookies: I) -> AppendHeaders<Vec<(header::HeaderName, String)>>
where
    I: IntoIterator<Item = String>,
{
    AppendHeaders(
        cookies
            .into_iter()
            .map(|cookie| (header::SET_COOKIE, cookie))
            .collect(),
    )
}

fn login_with_error(message: &str) -> Redirect {
    let query = serde_urlencoded::to_string([("error", message)]).unwrap_or_default();
    Redirect::to(&format!("{LOGIN_PATH}?{query}"))
}

/// Register with email and password.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/signup
/// { "email": "ada@example.com", "password": "secret" }
/// ```
///
/// # Response
///
/// ```json
/// { "status": "confirmation_required", "user": { "id": "...", "email": "ada@example.com" } }
/// ```
///
/// # Errors
///
/// - 422 for a malformed email or short password
/// - 409 if the email is already registered
/// - 400 / 502 if the auth service rejects or fails the request
#[tracing::instrument(skip_all, fields(email = %credentials.email))]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, AppError> {
    let client = state.signed_out_client();

    match client.auth().sign_up(&credentials).await? {
        SignUpOutcome::SignedIn(session) => {
            let jar = cookies::store_session(&session, state.secure_cookies());
            let body = SignUpResponse::SignedIn { user: session.user };
            Ok((set_cookies(jar), Json(body)).into_response())
        },
        SignUpOutcome::ConfirmationRequired(user) => {
            Ok(Json(SignUpResponse::ConfirmationRequired { user }).into_response())
        },
        SignUpOutcome::AlreadyRegistered => {
            Err(AppError::conflict("already_registered", ALREADY_REGISTERED))
        },
    }
}

/// Sign in with email and password.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/login
/// { "email": "ada@example.com", "password": "secret" }
/// ```
///
/// # Errors
///
/// - 401 `invalid_credentials` for a wrong email or password
/// - 400 / 502 if the auth service rejects or fails the request
#[tracing::instrument(skip_all, fields(email = %credentials.email))]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, AppError> {
    let client = state.signed_out_client();
    let session = client.auth().sign_in_with_password(&credentials).await?;

    let jar = cookies::store_session(&session, state.secure_cookies());
    Ok((set_cookies(jar), Json(SignInResponse { user: session.user })).into_response())
}

/// Sign out.
///
/// Revokes the session with the auth service when possible and always
/// clears the session cookies.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/signout
/// ```
///
/// # Response
///
/// ```json
/// { "success": true }
/// ```
#[tracing::instrument(skip_all)]
pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let client = state.client_for(&headers);
    if let Err(error) = client.auth().sign_out().await {
        tracing::warn!(%error, "Sign-out could not revoke the session");
    }

    let jar = cookies::clear_session(state.secure_cookies());
    (set_cookies(jar), Json(SignOutResponse { success: true })).into_response()
}

/// The signed-in user.
///
/// The access token is checked with the auth service and renewed if it
/// has expired.
///
/// # Endpoint
///
/// ```text
/// GET /api/auth/user
/// ```
///
/// # Response
///
/// ```json
/// { "id": "...", "email": "ada@example.com" }
/// ```
///
/// # Errors
///
/// - 401 if the session is missing or rejected; the session cookies are cleared
/// - 502 if the auth service fails
#[tracing::instrument(skip_all)]
pub async fn current_user(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = state.session_for(&headers);
    let result = match session.client().current_user().await {
        Ok(Some(user)) => Ok(Json(user)),
        Ok(None) => Err(AppError::from(TodoError::Unauthenticated)),
        Err(error) => Err(AppError::from(error)),
    };
    session.respond(result)
}

/// Start a Google sign-in.
///
/// Redirects to the auth service's authorize endpoint and keeps the PKCE
/// verifier in a short-lived cookie for the callback.
///
/// # Endpoint
///
/// ```text
/// GET /auth/google
/// ```
#[tracing::instrument(skip_all)]
pub async fn google(State(state): State<AppState>) -> Response {
    let client = state.signed_out_client();
    let redirect = client
        .auth()
        .authorize_url(OAuthProvider::Google, &client.config().callback_url());

    let cookie = cookies::store_code_verifier(&redirect.code_verifier, state.secure_cookies());
    (set_cookies([cookie]), Redirect::to(&redirect.url)).into_response()
}

/// Finish an OAuth sign-in or email confirmation.
///
/// # Endpoint
///
/// ```text
/// GET /auth/callback?code=...
/// ```
///
/// Redirects to `/todos` on success or when no code is given, and to
/// `/login?error=<message>` when the exchange fails.
#[tracing::instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let secure = state.secure_cookies();

    if let Some(error) = query.error_description.or(query.error) {
        tracing::warn!(%error, "Auth service reported a failed sign-in");
        return (set_cookies([cookies::clear_code_verifier(secure)]), login_with_error(&error))
            .into_response();
    }

    let Some(code) = query.code else {
        return Redirect::to(TODOS_PATH).into_response();
    };

    let Some(verifier) = cookies::read(&headers, cookies::CODE_VERIFIER) else {
        tracing::warn!("OAuth callback without a verifier cookie");
        return login_with_error(MISSING_VERIFIER).into_response();
    };

    let client = state.signed_out_client();
    match client.auth().exchange_code_for_session(&code, &verifier).await {
        Ok(session) => {
            let mut jar = cookies::store_session(&session, secure).to_vec();
            jar.push(cookies::clear_code_verifier(secure));
            (set_cookies(jar), Redirect::to(TODOS_PATH)).into_response()
        },
        Err(error) => {
            tracing::warn!(%error, "Code exchange failed");
            (
                set_cookies([cookies::clear_code_verifier(secure)]),
                login_with_error(&error.to_string()),
            )
                .into_response()
        },
    }
}

//! Session cookies.
//!
//! The access and refresh tokens live in `HttpOnly` cookies; a short-lived
//! cookie carries the PKCE verifier between `/auth/google` and
//! `/auth/callback`.

use axum::http::{header, HeaderMap};
use todo_sync_supabase::{AuthSession, SessionTokens};

/// Cookie holding the access token; its presence is what the route gate checks
pub const ACCESS_TOKEN: &str = "sb-access-token";

/// Cookie holding the refresh token
pub const REFRESH_TOKEN: &str = "sb-refresh-token";

/// Cookie holding the PKCE verifier of an OAuth sign-in in progress
pub const CODE_VERIFIER: &str = "sb-code-verifier";

/// Refresh tokens outlive the access token they came with
const REFRESH_TOKEN_MAX_AGE: i64 = 60 * 60 * 24 * 30;

/// Time allowed to finish an OAuth round trip
const CODE_VERIFIER_MAX_AGE: i64 = 60 * 10;

/// Value of the cookie `name`, if sent.
#[must_use]
pub fn read(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Whether the request carries a non-empty access token cookie
#[must_use]
pub fn has_session(headers: &HeaderMap) -> bool {
    read(headers, ACCESS_TOKEN).is_some_and(|token| !token.is_empty())
}

/// Tokens from the session cookies, if signed in
#[must_use]
pub fn session_tokens(headers: &HeaderMap) -> Option<SessionTokens> {
    let access_token = read(headers, ACCESS_TOKEN).filter(|token| !token.is_empty())?;
    Some(SessionTokens {
        access_token,
        refresh_token: read(headers, REFRESH_TOKEN).filter(|token| !token.is_empty()),
    })
}

/// `Set-Cookie` values storing `session`
#[must_use]
pub fn store_session(session: &AuthSession, secure: bool) -> [String; 2] {
    [
        set(ACCESS_TOKEN, &session.access_token, session.expires_in, secure),
        set(REFRESH_TOKEN, &session.refresh_token, REFRESH_TOKEN_MAX_AGE, secure),
    ]
}

/// `Set-Cookie` values removing the session
#[must_use]
pub fn clear_session(secure: bool) -> [String; 2] {
    [clear(ACCESS_TOKEN, secure), clear(REFRESH_TOKEN, secure)]
}

/// `Set-Cookie` value storing a PKCE verifier
#[must_use]
pub fn store_code_verifier(verifier: &str, secure: bool) -> String {
    set(CODE_VERIFIER, verifier, CODE_VERIFIER_MAX_AGE, secure)
}

/// `Set-Cookie` value removing the PKCE verifier
#[must_use]
pub fn clear_code_verifier(secure: bool) -> String {
    clear(CODE_VERIFIER, secure)
}

fn set(name: &str, value: &str, max_age: i64, secure: bool) -> String {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn clear(name: &str, secure: bool) -> String {
    set(name, "", 0, secure)
}

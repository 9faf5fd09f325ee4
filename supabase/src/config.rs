//! Configuration for the Supabase client.
//!
//! Loads configuration from environment variables, with defaults for
//! everything except the project URL and anon key.

use crate::error::{Result, SupabaseError};
use std::env;
use std::time::Duration;

/// Default public origin of the web app, used for OAuth and email redirects
pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for one Supabase project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Project URL, without a trailing slash
    pub url: String,
    /// Public anon key, sent as `apikey` on every request
    pub anon_key: String,
    /// Public origin of the web app
    pub site_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl SupabaseConfig {
    /// Settings for `url` and `anon_key`, defaults elsewhere.
    #[must_use]
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            site_url: DEFAULT_SITE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | variable                | default                  |
    /// |-------------------------|--------------------------|
    /// | `SUPABASE_URL`          | required                 |
    /// | `SUPABASE_ANON_KEY`     | required                 |
    /// | `SITE_URL`              | `http://localhost:3000`  |
    /// | `SUPABASE_TIMEOUT_SECS` | `10`                     |
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::MissingConfig`] if the URL or key is unset or empty.
    pub fn from_env() -> Result<Self> {
        let url = required("SUPABASE_URL")?;
        let anon_key = required("SUPABASE_ANON_KEY")?;

        let mut config = Self::new(url, anon_key);
        config.site_url = env::var("SITE_URL")
            .unwrap_or_else(|_| DEFAULT_SITE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        config.request_timeout = env::var("SUPABASE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs);
        Ok(config)
    }

    /// Use `site_url` as the public origin
    #[must_use]
    pub fn with_site_url(mut self, site_url: impl Into<String>) -> Self {
        self.site_url = site_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use `timeout` for every request
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// URL of a GoTrue endpoint, e.g. `auth_url("token")`
    #[must_use]
    pub fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{endpoint}", self.url)
    }

    /// URL of a PostgREST relation, e.g. `rest_url("todos")`
    #[must_use]
    pub fn rest_url(&self, relation: &str) -> String {
        format!("{}/rest/v1/{relation}", self.url)
    }

    /// Where the auth service sends users back after OAuth or email confirmation
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}/auth/callback", self.site_url)
    }
}

fn required(name: &'static str) -> Result<String> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(SupabaseError::MissingConfig(name))
}

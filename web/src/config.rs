//! Server configuration.

use std::env;
use thiserror::Error;
use todo_sync_supabase::{SupabaseConfig, SupabaseError};

/// Default bind address
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port
pub const DEFAULT_PORT: u16 = 8080;

/// Errors loading [`ServerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Supabase settings are missing
    #[error(transparent)]
    Supabase(#[from] SupabaseError),

    /// `PORT` is not a valid port number
    #[error("Invalid PORT: {0}")]
    InvalidPort(String),
}

/// Everything the server needs at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Backend project
    pub supabase: SupabaseConfig,
}

impl ServerConfig {
    /// Settings for `supabase` on the default address.
    #[must_use]
    pub fn new(supabase: SupabaseConfig) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            supabase,
        }
    }

    /// Load from `HOST`, `PORT`, and the Supabase variables.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Supabase`] if the project URL or anon key is missing
    /// - [`ConfigError::InvalidPort`] if `PORT` is set but not a port number
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new(SupabaseConfig::from_env()?);
        if let Ok(host) = env::var("HOST") {
            config.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;
        }
        Ok(config)
    }

    /// `host:port` for binding
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Session cookies get `Secure` when the site is served over HTTPS
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.supabase.site_url.starts_with("https://")
    }
}

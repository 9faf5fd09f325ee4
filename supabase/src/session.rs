//! Session provider backed by the auth API.

use crate::client::SupabaseClient;
use crate::error::SupabaseError;
use reqwest::Method;
use std::future::Future;
use tokio::sync::watch;
use todos::{SessionProvider, TodoError, User};

impl SessionProvider for SupabaseClient {
    /// Check the stored access token with `GET /auth/v1/user`.
    ///
    /// A rejected access token is renewed with the refresh token when one
    /// is stored; the renewed session carries the user. Without a usable
    /// refresh token the session is dropped and the client is signed out.
    fn current_user(&self) -> impl Future<Output = todos::Result<Option<User>>> + Send {
        let client = self.clone();

        async move {
            if client.tokens().is_none() {
                return Ok(None);
            }

            let request = client.request(Method::GET, &client.config().auth_url("user"));
            match SupabaseClient::send_json::<User>(request).await {
                Ok(user) => {
                    client.publish_user(Some(user.clone()));
                    Ok(Some(user))
                },
                Err(SupabaseError::Unauthorized(message)) => {
                    tracing::info!(%message, "Access token rejected");
                    match client.refresh_session().await.map_err(TodoError::from)? {
                        Some(session) => Ok(Some(session.user)),
                        None => {
                            client.clear_session();
                            Ok(None)
                        },
                    }
                },
                Err(error) => Err(TodoError::from(error)),
            }
        }
    }

    fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.subscribe_user()
    }
}

//! Mock session provider for testing.

use crate::error::Result;
use crate::providers::SessionProvider;
use crate::state::User;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Mock session provider.
///
/// Holds the current user in a `watch` channel, so tests can sign in and
/// out and observe the change through [`SessionProvider::subscribe`].
#[derive(Debug, Clone)]
pub struct MockSessionProvider {
    user: Arc<watch::Sender<Option<User>>>,
}

impl MockSessionProvider {
    /// Create a provider holding `user`.
    #[must_use]
    pub fn new(user: Option<User>) -> Self {
        let (sender, _) = watch::channel(user);
        Self {
            user: Arc::new(sender),
        }
    }

    /// Provider with an active session for `user`.
    #[must_use]
    pub fn signed_in(user: User) -> Self {
        Self::new(Some(user))
    }

    /// Provider with no session.
    #[must_use]
    pub fn signed_out() -> Self {
        Self::new(None)
    }

    /// Start a session for `user`.
    pub fn sign_in(&self, user: User) {
        self.user.send_replace(Some(user));
    }

    /// End the session.
    pub fn sign_out(&self) {
        self.user.send_replace(None);
    }
}

impl SessionProvider for MockSessionProvider {
    fn current_user(&self) -> impl Future<Output = Result<Option<User>>> + Send {
        let user = self.user.borrow().clone();
        async move { Ok(user) }
    }

    fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.user.subscribe()
    }
}

//! Session provider trait.

use crate::error::Result;
use crate::state::User;
use tokio::sync::watch;

/// Source of the current authenticated principal.
///
/// The todo store only reads `current_user().id`; the change subscription
/// is for callers that want to rebuild or refresh a store when the
/// principal changes (sign-in, sign-out, token expiry).
pub trait SessionProvider: Clone + Send + Sync + 'static {
    /// The signed-in user, or `None` when there is no active session.
    ///
    /// # Errors
    ///
    /// Returns error if the session could not be checked with the auth
    /// service (network failure, unexpected response).
    fn current_user(&self) -> impl std::future::Future<Output = Result<Option<User>>> + Send;

    /// Subscribe to principal changes.
    ///
    /// The receiver starts out holding the current value.
    fn subscribe(&self) -> watch::Receiver<Option<User>>;
}

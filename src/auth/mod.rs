//! Identity provider contract.

pub mod local;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::AppResult;

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub display_name: Option<String>,
    pub email: String,
}

impl Identity {
    /// Name shown next to posts and comments; falls back to the email.
    pub fn display_label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Run the sign-in flow. Fails with an auth error when the user backs
    /// out or the provider rejects the attempt.
    async fn sign_in(&self) -> AppResult<Identity>;

    async fn sign_out(&self);

    /// Identity of the currently signed-in user, if any.
    fn current_identity(&self) -> Option<Identity>;

    /// Watch channel tracking sign-in state changes.
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;
}

//! Local identity provider for single-user deployments.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::{AppError, AppResult};

use super::{Identity, IdentityProvider};

/// Signs a fixed identity in and out. Stands in for an external identity
/// service in local deployments and tests.
pub struct LocalIdentityProvider {
    identity: Identity,
    deny: bool,
    state: watch::Sender<Option<Identity>>,
}

impl LocalIdentityProvider {
    pub fn new(identity: Identity) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            identity,
            deny: false,
            state,
        }
    }

    /// Provider that refuses every sign-in attempt, as when the user backs
    /// out of the sign-in flow.
    pub fn denying(identity: Identity) -> Self {
        let mut provider = Self::new(identity);
        provider.deny = true;
        provider
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_in(&self) -> AppResult<Identity> {
        if self.deny {
            return Err(AppError::Auth("sign-in request was dismissed".into()));
        }
        self.state.send_replace(Some(self.identity.clone()));
        tracing::info!(user_id = %self.identity.id, "signed in");
        Ok(self.identity.clone())
    }

    async fn sign_out(&self) {
        if let Some(identity) = self.state.send_replace(None) {
            tracing::info!(user_id = %identity.id, "signed out");
        }
    }

    fn current_identity(&self) -> Option<Identity> {
        self.state.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.state.subscribe()
    }
}

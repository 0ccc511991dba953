//! Shared application state handed to every request handler.

use std::sync::Arc;

use tokio::sync::watch;

use crate::auth::IdentityProvider;
use crate::config::Config;
use crate::feed::FeedState;
use crate::services::PostService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<dyn IdentityProvider>,
    pub posts: PostService,
    pub feed: watch::Receiver<FeedState>,
}

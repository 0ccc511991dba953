//! Live feed view.
//!
//! [`FeedView`] owns one store subscription plus a pump task that folds
//! snapshot and sign-in events into a watch channel of projected feed
//! state. Dropping the view (or calling [`FeedView::stop`]) cancels the
//! pump and detaches the subscription from the store.

pub mod projector;

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::auth::Identity;
use crate::error::AppResult;
use crate::metrics;
use crate::models::PostRecord;
use crate::store::{DocumentStore, SnapshotEvent, SnapshotStream};

pub use projector::{project, CommentView, PostView};

/// Projected feed state as of one revision.
#[derive(Debug, Clone)]
pub struct FeedState {
    pub posts: Vec<PostView>,
    /// Increases by one on every republish, never decreases.
    pub revision: u64,
    /// False once the underlying subscription is lost or closed. The last
    /// good posts stay readable.
    pub live: bool,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            posts: Vec::new(),
            revision: 0,
            live: true,
        }
    }
}

pub struct FeedView {
    state: watch::Receiver<FeedState>,
    pump: JoinHandle<()>,
}

impl FeedView {
    /// Subscribe to `collection` and start pumping its snapshots.
    pub async fn start(
        store: Arc<dyn DocumentStore>,
        identity: watch::Receiver<Option<Identity>>,
        collection: &str,
    ) -> AppResult<Self> {
        let stream = store.subscribe(collection).await?;
        let (tx, rx) = watch::channel(FeedState::default());
        let pump = tokio::spawn(run_pump(stream, identity, tx, collection.to_string()));
        Ok(Self { state: rx, pump })
    }

    /// Watch handle for the projected state.
    pub fn watch(&self) -> watch::Receiver<FeedState> {
        self.state.clone()
    }

    pub fn current(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// Cancel the pump and detach the store subscription.
    pub fn stop(&self) {
        self.pump.abort();
    }
}

impl Drop for FeedView {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

async fn run_pump(
    mut stream: SnapshotStream,
    mut identity: watch::Receiver<Option<Identity>>,
    state: watch::Sender<FeedState>,
    collection: String,
) {
    let mut records: Vec<PostRecord> = Vec::new();
    let mut revision: u64 = 0;
    let mut watch_identity = true;

    loop {
        tokio::select! {
            event = stream.next_event() => match event {
                Some(SnapshotEvent::Snapshot(documents)) => {
                    records = documents.iter().map(PostRecord::from_document).collect();
                    revision += 1;
                    metrics::FEED_SNAPSHOTS_TOTAL.inc();
                    metrics::FEED_POSTS.set(records.len() as i64);
                    tracing::debug!(
                        collection = %collection,
                        revision,
                        posts = records.len(),
                        "feed snapshot applied"
                    );
                    publish(&state, &records, &identity, revision, true);
                }
                Some(SnapshotEvent::Lost(reason)) => {
                    tracing::error!(collection = %collection, %reason, "feed subscription lost");
                    revision += 1;
                    publish(&state, &records, &identity, revision, false);
                    break;
                }
                None => {
                    tracing::warn!(collection = %collection, "feed snapshot stream closed");
                    revision += 1;
                    publish(&state, &records, &identity, revision, false);
                    break;
                }
            },
            changed = identity.changed(), if watch_identity => match changed {
                Ok(()) => {
                    revision += 1;
                    tracing::debug!(
                        collection = %collection,
                        revision,
                        "sign-in state changed, reprojecting feed"
                    );
                    publish(&state, &records, &identity, revision, true);
                }
                Err(_) => {
                    // Provider gone; keep serving snapshots under the last identity.
                    watch_identity = false;
                }
            },
        }
    }
}

fn publish(
    state: &watch::Sender<FeedState>,
    records: &[PostRecord],
    identity: &watch::Receiver<Option<Identity>>,
    revision: u64,
    live: bool,
) {
    let current = identity.borrow().as_ref().map(|who| who.id.clone());
    let posts = project(records, current.as_deref());
    state.send_replace(FeedState {
        posts,
        revision,
        live,
    });
}

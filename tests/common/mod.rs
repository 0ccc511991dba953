//! Shared test doubles for the collaborator seams.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;

use photofeed::auth::Identity;
use photofeed::error::{AppError, AppResult};
use photofeed::feed::FeedState;
use photofeed::media::MediaStore;
use photofeed::store::{DocumentStore, FieldUpdate, SnapshotEvent, SnapshotStream};

/// One collaborator call, in issue order across every double sharing a log.
#[derive(Debug, Clone, PartialEq)]
pub enum CollabCall {
    MediaWrite { key: String },
    MediaUrl { key: String },
    DocumentAdd { collection: String },
    DocumentUpdate { collection: String, id: String },
}

pub type CallLog = Arc<Mutex<Vec<CollabCall>>>;

pub fn new_call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn log_calls(log: &CallLog) -> Vec<CollabCall> {
    log.lock().unwrap().clone()
}

/// Media store double that records calls and can be told to fail writes.
pub struct RecordingMediaStore {
    log: CallLog,
    fail_write: bool,
}

impl RecordingMediaStore {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            fail_write: false,
        }
    }

    pub fn failing_writes(log: CallLog) -> Self {
        Self {
            log,
            fail_write: true,
        }
    }
}

#[async_trait]
impl MediaStore for RecordingMediaStore {
    async fn write(&self, key: &str, _bytes: Vec<u8>, _content_type: &str) -> AppResult<()> {
        self.log.lock().unwrap().push(CollabCall::MediaWrite {
            key: key.to_string(),
        });
        if self.fail_write {
            return Err(AppError::Storage("simulated upload failure".into()));
        }
        Ok(())
    }

    async fn durable_url(&self, key: &str) -> AppResult<String> {
        self.log.lock().unwrap().push(CollabCall::MediaUrl {
            key: key.to_string(),
        });
        Ok(format!("https://media.test/{key}"))
    }
}

/// Document store double that records calls without storing anything.
pub struct RecordingStore {
    log: CallLog,
}

impl RecordingStore {
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn add(&self, collection: &str, _fields: Map<String, Value>) -> AppResult<String> {
        self.log.lock().unwrap().push(CollabCall::DocumentAdd {
            collection: collection.to_string(),
        });
        Ok("recorded-post".to_string())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        _updates: Vec<FieldUpdate>,
    ) -> AppResult<()> {
        self.log.lock().unwrap().push(CollabCall::DocumentUpdate {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        Ok(())
    }

    async fn subscribe(&self, _collection: &str) -> AppResult<SnapshotStream> {
        let (_tx, rx) = mpsc::unbounded_channel();
        Ok(SnapshotStream::new(rx))
    }
}

/// Store double whose snapshot stream is driven by the test.
#[derive(Clone, Default)]
pub struct ScriptedStore {
    senders: Arc<Mutex<Vec<mpsc::UnboundedSender<SnapshotEvent>>>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to every open subscription.
    pub fn push(&self, event: SnapshotEvent) {
        for sender in self.senders.lock().unwrap().iter() {
            let _ = sender.send(event.clone());
        }
    }
}

#[async_trait]
impl DocumentStore for ScriptedStore {
    async fn add(&self, _collection: &str, _fields: Map<String, Value>) -> AppResult<String> {
        Err(AppError::Store("scripted store does not accept writes".into()))
    }

    async fn update(
        &self,
        _collection: &str,
        _id: &str,
        _updates: Vec<FieldUpdate>,
    ) -> AppResult<()> {
        Err(AppError::Store("scripted store does not accept writes".into()))
    }

    async fn subscribe(&self, _collection: &str) -> AppResult<SnapshotStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().unwrap().push(tx);
        Ok(SnapshotStream::new(rx))
    }
}

pub fn identity(id: &str, name: &str) -> Identity {
    Identity {
        id: id.to_string(),
        display_name: Some(name.to_string()),
        email: format!("{id}@example.com"),
    }
}

/// Wait until the watched feed state satisfies the predicate, returning the
/// first state that does.
pub async fn wait_for(
    watcher: &mut watch::Receiver<FeedState>,
    predicate: impl Fn(&FeedState) -> bool,
) -> FeedState {
    let outcome = timeout(Duration::from_secs(2), async {
        loop {
            {
                let state = watcher.borrow_and_update();
                if predicate(&state) {
                    return state.clone();
                }
            }
            watcher
                .changed()
                .await
                .expect("feed state channel closed while waiting");
        }
    })
    .await;
    outcome.expect("timed out waiting for feed state")
}

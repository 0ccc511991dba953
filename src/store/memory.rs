//! In-process document store.
//!
//! Keeps collections in a mutex-guarded registry and fans a fresh
//! full-collection snapshot out to every subscriber after each committed
//! write. Snapshot building and delivery happen inside one critical section,
//! so no subscriber ever observes snapshots out of order.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::fields;

use super::{
    is_server_timestamp, Document, DocumentStore, FieldOp, FieldUpdate, SnapshotEvent,
    SnapshotStream, SubscriptionGuard,
};

struct StoredDocument {
    id: String,
    /// Insertion sequence, used to break creation-time ties.
    seq: u64,
    fields: Map<String, Value>,
}

impl StoredDocument {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.fields
            .get(fields::CREATED_AT)
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc))
    }
}

struct Subscriber {
    id: Uuid,
    sender: mpsc::UnboundedSender<SnapshotEvent>,
}

#[derive(Default)]
struct Collection {
    documents: HashMap<String, StoredDocument>,
    subscribers: Vec<Subscriber>,
}

impl Collection {
    /// Current state ordered newest first. Documents without a readable
    /// creation time sort last; ties fall back to insertion order, later
    /// writes first.
    fn snapshot(&self) -> Vec<Document> {
        let mut ordered: Vec<&StoredDocument> = self.documents.values().collect();
        ordered.sort_by(|a, b| match (a.created_at(), b.created_at()) {
            (Some(a_ts), Some(b_ts)) => b_ts.cmp(&a_ts).then_with(|| b.seq.cmp(&a.seq)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => b.seq.cmp(&a.seq),
        });
        ordered
            .into_iter()
            .map(|doc| Document {
                id: doc.id.clone(),
                fields: doc.fields.clone(),
            })
            .collect()
    }
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Collection>,
    next_seq: u64,
}

impl Inner {
    fn collection_mut(&mut self, collection: &str) -> &mut Collection {
        self.collections.entry(collection.to_string()).or_default()
    }

    /// Send the current snapshot to every subscriber, dropping the ones
    /// whose receiving side is gone.
    fn publish(&mut self, collection: &str) {
        if let Some(state) = self.collections.get_mut(collection) {
            let snapshot = state.snapshot();
            state.subscribers.retain(|sub| {
                sub.sender
                    .send(SnapshotEvent::Snapshot(snapshot.clone()))
                    .is_ok()
            });
        }
    }
}

/// Shared in-memory [`DocumentStore`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| AppError::Store("memory store lock poisoned".into()))
    }

    /// Number of live subscriptions on a collection.
    pub fn subscriber_count(&self, collection: &str) -> usize {
        self.lock()
            .map(|inner| {
                inner
                    .collections
                    .get(collection)
                    .map(|state| state.subscribers.len())
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }

    /// Direct read of one stored document, mainly for assertions in tests.
    pub fn document(&self, collection: &str, id: &str) -> Option<Document> {
        let inner = self.lock().ok()?;
        let doc = inner.collections.get(collection)?.documents.get(id)?;
        Some(Document {
            id: doc.id.clone(),
            fields: doc.fields.clone(),
        })
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn add(&self, collection: &str, fields: Map<String, Value>) -> AppResult<String> {
        let id = Uuid::new_v4().to_string();
        let now = now_rfc3339();

        let mut fields = fields;
        for value in fields.values_mut() {
            resolve_server_timestamps(value, &now);
        }

        let mut inner = self.lock()?;
        inner.next_seq += 1;
        let seq = inner.next_seq;
        inner.collection_mut(collection).documents.insert(
            id.clone(),
            StoredDocument {
                id: id.clone(),
                seq,
                fields,
            },
        );
        inner.publish(collection);

        tracing::debug!(collection, document = %id, "document added");
        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        updates: Vec<FieldUpdate>,
    ) -> AppResult<()> {
        let now = now_rfc3339();
        let mut inner = self.lock()?;

        let doc = inner
            .collections
            .get_mut(collection)
            .and_then(|state| state.documents.get_mut(id))
            .ok_or_else(|| AppError::NotFound(format!("document {collection}/{id}")))?;
        for update in updates {
            apply_update(&mut doc.fields, update, &now);
        }
        inner.publish(collection);

        tracing::debug!(collection, document = %id, "document updated");
        Ok(())
    }

    async fn subscribe(&self, collection: &str) -> AppResult<SnapshotStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscriber_id = Uuid::new_v4();

        let mut inner = self.lock()?;
        let state = inner.collection_mut(collection);
        let _ = tx.send(SnapshotEvent::Snapshot(state.snapshot()));
        state.subscribers.push(Subscriber {
            id: subscriber_id,
            sender: tx,
        });
        drop(inner);

        tracing::debug!(collection, subscriber = %subscriber_id, "feed subscription opened");

        let registry = self.inner.clone();
        let owner = collection.to_string();
        let guard = SubscriptionGuard::new(move || {
            if let Ok(mut inner) = registry.lock() {
                if let Some(state) = inner.collections.get_mut(&owner) {
                    state.subscribers.retain(|sub| sub.id != subscriber_id);
                }
            }
            tracing::debug!(collection = %owner, subscriber = %subscriber_id, "feed subscription closed");
        });

        Ok(SnapshotStream::with_guard(rx, guard))
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Replace every server-timestamp marker in the value tree with `now`.
/// Only the marker object shape matches; strings pass through untouched.
fn resolve_server_timestamps(value: &mut Value, now: &str) {
    if is_server_timestamp(value) {
        *value = Value::String(now.to_string());
        return;
    }
    match value {
        Value::Array(items) => {
            for item in items {
                resolve_server_timestamps(item, now);
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                resolve_server_timestamps(item, now);
            }
        }
        _ => {}
    }
}

fn apply_update(fields: &mut Map<String, Value>, update: FieldUpdate, now: &str) {
    let FieldUpdate { field, op } = update;
    match op {
        FieldOp::Set(mut value) => {
            resolve_server_timestamps(&mut value, now);
            fields.insert(field, value);
        }
        FieldOp::ArrayUnion(mut value) => {
            resolve_server_timestamps(&mut value, now);
            apply_array_op(fields, field, |items| {
                if !items.contains(&value) {
                    items.push(value);
                }
            });
        }
        FieldOp::ArrayRemove(mut value) => {
            resolve_server_timestamps(&mut value, now);
            apply_array_op(fields, field, |items| {
                items.retain(|item| item != &value);
            });
        }
        FieldOp::ArrayAppend(mut value) => {
            resolve_server_timestamps(&mut value, now);
            apply_array_op(fields, field, |items| items.push(value));
        }
    }
}

/// Run an array mutation against the field, first replacing a missing or
/// non-array value with an empty array.
fn apply_array_op(
    fields: &mut Map<String, Value>,
    field: String,
    mutate: impl FnOnce(&mut Vec<Value>),
) {
    let entry = fields
        .entry(field)
        .or_insert_with(|| Value::Array(Vec::new()));
    if !entry.is_array() {
        *entry = Value::Array(Vec::new());
    }
    if let Value::Array(items) = entry {
        mutate(items);
    }
}

//! Document store contract.
//!
//! Posts live in a schemaless document collection. The store accepts
//! field-level atomic updates and pushes full-collection snapshots to
//! subscribers after every committed write.

pub mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::error::AppResult;

/// Reserved key carried by the server-timestamp marker object.
pub const SERVER_TIMESTAMP_KEY: &str = "__server_timestamp__";

/// Marker resolved to the store's own clock when the write is applied.
///
/// The marker is an object with a single reserved key. Plain strings are
/// never interpreted as markers, so user text that happens to spell the
/// reserved key is stored verbatim.
pub fn server_timestamp() -> Value {
    let mut marker = Map::new();
    marker.insert(SERVER_TIMESTAMP_KEY.to_string(), Value::Bool(true));
    Value::Object(marker)
}

/// True for exactly the marker shape produced by [`server_timestamp`].
pub fn is_server_timestamp(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.len() == 1 && map.contains_key(SERVER_TIMESTAMP_KEY),
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// One field mutation. All updates in a batch commit together.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    /// Replace the field with the value.
    Set(Value),
    /// Add the element to an array field unless an equal element exists.
    ArrayUnion(Value),
    /// Remove every element equal to the value.
    ArrayRemove(Value),
    /// Append the element unconditionally.
    ArrayAppend(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub field: String,
    pub op: FieldOp,
}

impl FieldUpdate {
    pub fn set(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FieldOp::Set(value),
        }
    }

    pub fn array_union(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FieldOp::ArrayUnion(value),
        }
    }

    pub fn array_remove(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FieldOp::ArrayRemove(value),
        }
    }

    pub fn array_append(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FieldOp::ArrayAppend(value),
        }
    }
}

/// Event delivered on a collection subscription.
#[derive(Debug, Clone)]
pub enum SnapshotEvent {
    /// Full state of the collection, newest first.
    Snapshot(Vec<Document>),
    /// The subscription can deliver no further snapshots.
    Lost(String),
}

/// Runs a cleanup closure when dropped.
pub struct SubscriptionGuard {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionGuard {
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

/// Live snapshot feed for one collection.
///
/// Dropping the stream detaches the subscription from the store.
pub struct SnapshotStream {
    events: mpsc::UnboundedReceiver<SnapshotEvent>,
    _guard: Option<SubscriptionGuard>,
}

impl SnapshotStream {
    pub fn new(events: mpsc::UnboundedReceiver<SnapshotEvent>) -> Self {
        Self {
            events,
            _guard: None,
        }
    }

    pub fn with_guard(
        events: mpsc::UnboundedReceiver<SnapshotEvent>,
        guard: SubscriptionGuard,
    ) -> Self {
        Self {
            events,
            _guard: Some(guard),
        }
    }

    /// Next event, or `None` once the sending side is gone.
    pub async fn next_event(&mut self) -> Option<SnapshotEvent> {
        self.events.recv().await
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document under a generated id and return the id.
    async fn add(&self, collection: &str, fields: Map<String, Value>) -> AppResult<String>;

    /// Apply the updates to one document as a single atomic batch.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        updates: Vec<FieldUpdate>,
    ) -> AppResult<()>;

    /// Subscribe to full-collection snapshots. The current state arrives
    /// immediately; every committed write delivers a fresh snapshot.
    async fn subscribe(&self, collection: &str) -> AppResult<SnapshotStream>;
}

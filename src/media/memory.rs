//! In-process blob store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{AppError, AppResult};

use super::MediaStore;

struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

/// Keeps uploaded objects in memory and builds URLs under a configured
/// public base.
#[derive(Clone)]
pub struct MemoryMediaStore {
    public_base_url: String,
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
}

impl MemoryMediaStore {
    pub fn new(public_base_url: &str) -> Self {
        Self {
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            objects: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, HashMap<String, StoredObject>>> {
        self.objects
            .lock()
            .map_err(|_| AppError::Storage("media store lock poisoned".into()))
    }

    pub fn object_count(&self) -> usize {
        self.lock().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn object_bytes(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().ok()?.get(key).map(|object| object.bytes.clone())
    }

    pub fn object_content_type(&self, key: &str) -> Option<String> {
        self.lock()
            .ok()?
            .get(key)
            .map(|object| object.content_type.clone())
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn write(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<()> {
        let size = bytes.len();
        let mut objects = self.lock()?;
        objects.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        tracing::debug!(key, size, content_type, "media object stored");
        Ok(())
    }

    async fn durable_url(&self, key: &str) -> AppResult<String> {
        let objects = self.lock()?;
        if !objects.contains_key(key) {
            return Err(AppError::Storage(format!("media object not found: {key}")));
        }
        Ok(format!("{}/{}", self.public_base_url, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_url() {
        let media = MemoryMediaStore::new("https://media.local");
        media
            .write("uploads/u1/1_cat.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();

        let url = media.durable_url("uploads/u1/1_cat.png").await.unwrap();
        assert_eq!(url, "https://media.local/uploads/u1/1_cat.png");
        assert_eq!(media.object_count(), 1);
        assert_eq!(media.object_bytes("uploads/u1/1_cat.png"), Some(vec![1, 2, 3]));
        assert_eq!(
            media.object_content_type("uploads/u1/1_cat.png").as_deref(),
            Some("image/png")
        );
    }

    #[tokio::test]
    async fn url_for_unknown_key_is_storage_error() {
        let media = MemoryMediaStore::new("https://media.local");
        let err = media.durable_url("uploads/u1/missing.png").await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
    }

    #[tokio::test]
    async fn trailing_slash_in_base_is_normalized() {
        let media = MemoryMediaStore::new("https://media.local/");
        media.write("k", Vec::new(), "image/png").await.unwrap();
        assert_eq!(media.durable_url("k").await.unwrap(), "https://media.local/k");
    }
}

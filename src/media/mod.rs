//! Blob storage contract for uploaded media.

pub mod memory;

use async_trait::async_trait;

use crate::error::AppResult;

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store the object durably under `key`. Returns only once the bytes
    /// are safe to reference from a post document.
    async fn write(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<()>;

    /// Durable public URL for a previously written object.
    async fn durable_url(&self, key: &str) -> AppResult<String>;
}

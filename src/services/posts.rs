//! Post mutations: like, unlike, comment, create.

use std::sync::Arc;

use chrono::Utc;
use mime::Mime;
use serde_json::{Map, Value};

use crate::auth::{Identity, IdentityProvider};
use crate::error::{AppError, AppResult};
use crate::media::MediaStore;
use crate::metrics;
use crate::models::{fields, MediaKind};
use crate::store::{server_timestamp, DocumentStore, FieldUpdate};

/// A file accepted from the composer form.
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub file_name: String,
    pub content_type: Mime,
    pub bytes: Vec<u8>,
}

/// Issues feed mutations on behalf of the signed-in user.
///
/// Every method checks for a signed-in identity up front; a signed-out call
/// fails with a precondition error before any store or media traffic.
#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn DocumentStore>,
    media: Arc<dyn MediaStore>,
    auth: Arc<dyn IdentityProvider>,
    collection: String,
}

impl PostService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        media: Arc<dyn MediaStore>,
        auth: Arc<dyn IdentityProvider>,
        collection: &str,
    ) -> Self {
        Self {
            store,
            media,
            auth,
            collection: collection.to_string(),
        }
    }

    fn require_identity(&self, action: &str) -> AppResult<Identity> {
        self.auth
            .current_identity()
            .ok_or_else(|| AppError::Precondition(format!("sign in to {action}")))
    }

    /// Record a like. Safe to repeat: the store unions the user id into the
    /// likes array, so double likes collapse into one entry.
    pub async fn like(&self, post_id: &str) -> AppResult<()> {
        let who = self.require_identity("like posts")?;
        let update = FieldUpdate::array_union(fields::LIKES, Value::String(who.id.clone()));
        let outcome = self
            .store
            .update(&self.collection, post_id, vec![update])
            .await;
        track("like", &outcome);
        if outcome.is_ok() {
            tracing::debug!(post_id, user_id = %who.id, "post liked");
        }
        outcome
    }

    /// Withdraw a like. Removing an absent like is a no-op.
    pub async fn unlike(&self, post_id: &str) -> AppResult<()> {
        let who = self.require_identity("like posts")?;
        let update = FieldUpdate::array_remove(fields::LIKES, Value::String(who.id.clone()));
        let outcome = self
            .store
            .update(&self.collection, post_id, vec![update])
            .await;
        track("unlike", &outcome);
        if outcome.is_ok() {
            tracing::debug!(post_id, user_id = %who.id, "post unliked");
        }
        outcome
    }

    /// Append a comment carrying the author's id, display name, the trimmed
    /// text, and a server-assigned timestamp.
    pub async fn add_comment(&self, post_id: &str, text: &str) -> AppResult<()> {
        let who = self.require_identity("comment")?;
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Precondition("comment text is empty".into()));
        }

        let mut comment = Map::new();
        comment.insert(fields::USER_ID.to_string(), Value::String(who.id.clone()));
        comment.insert(
            fields::USER_NAME.to_string(),
            Value::String(who.display_label().to_string()),
        );
        comment.insert(fields::TEXT.to_string(), Value::String(text.to_string()));
        comment.insert(fields::CREATED_AT.to_string(), server_timestamp());

        let update = FieldUpdate::array_append(fields::COMMENTS, Value::Object(comment));
        let outcome = self
            .store
            .update(&self.collection, post_id, vec![update])
            .await;
        track("comment", &outcome);
        if outcome.is_ok() {
            tracing::debug!(post_id, user_id = %who.id, "comment added");
        }
        outcome
    }

    /// Share a new post. The media object is written first; the post
    /// document referencing its durable URL is only created once the upload
    /// has completed, so the feed never links media that is not yet stored.
    pub async fn create_post(&self, upload: NewUpload) -> AppResult<String> {
        let who = self.require_identity("upload")?;
        let outcome = self.upload_and_write(&who, upload).await;
        track("create_post", &outcome);
        outcome
    }

    async fn upload_and_write(&self, who: &Identity, upload: NewUpload) -> AppResult<String> {
        let kind = MediaKind::from_mime(&upload.content_type);
        let key = format!(
            "uploads/{}/{}_{}",
            who.id,
            Utc::now().timestamp_millis(),
            sanitize_file_name(&upload.file_name)
        );
        let size = upload.bytes.len();

        self.media
            .write(&key, upload.bytes, upload.content_type.essence_str())
            .await?;
        let media_url = self.media.durable_url(&key).await?;

        let mut doc = Map::new();
        doc.insert(fields::USER_ID.to_string(), Value::String(who.id.clone()));
        doc.insert(
            fields::USER_NAME.to_string(),
            Value::String(who.display_label().to_string()),
        );
        doc.insert(fields::MEDIA_URL.to_string(), Value::String(media_url));
        doc.insert(
            fields::MEDIA_TYPE.to_string(),
            Value::String(kind.as_marker().to_string()),
        );
        doc.insert(fields::CREATED_AT.to_string(), server_timestamp());
        doc.insert(fields::LIKES.to_string(), Value::Array(Vec::new()));
        doc.insert(fields::COMMENTS.to_string(), Value::Array(Vec::new()));

        let post_id = self.store.add(&self.collection, doc).await?;
        metrics::UPLOAD_BYTES_TOTAL.inc_by(size as u64);
        tracing::info!(
            post_id = %post_id,
            user_id = %who.id,
            kind = kind.as_marker(),
            size,
            "post created"
        );
        Ok(post_id)
    }
}

fn track<T>(operation: &str, outcome: &AppResult<T>) {
    let label = if outcome.is_ok() { "ok" } else { "error" };
    metrics::MUTATIONS_TOTAL
        .with_label_values(&[operation, label])
        .inc();
}

/// Reduce a client-supplied file name to characters that stay inert inside
/// object keys and the URLs built from them. Everything outside
/// `[A-Za-z0-9._-]` becomes an underscore; an empty name becomes `upload`.
fn sanitize_file_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|ch| match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '_' | '-' => ch,
            _ => '_',
        })
        .collect();
    if safe.is_empty() {
        "upload".to_string()
    } else {
        safe
    }
}

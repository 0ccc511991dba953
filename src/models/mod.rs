//! Domain records decoded from feed documents.
//!
//! Documents are schemaless, so every accessor here is lenient: a missing or
//! mistyped field falls back to a default instead of failing the whole feed.

use chrono::{DateTime, Utc};
use mime::Mime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Document;

/// Wire-level field names used in post documents.
pub mod fields {
    pub const USER_ID: &str = "userId";
    pub const USER_NAME: &str = "userName";
    pub const MEDIA_URL: &str = "mediaURL";
    pub const MEDIA_TYPE: &str = "mediaType";
    pub const CREATED_AT: &str = "createdAt";
    pub const LIKES: &str = "likes";
    pub const COMMENTS: &str = "comments";
    pub const TEXT: &str = "text";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// Decode the `mediaType` document field. Only the exact photo marker
    /// selects a photo; everything else, including a missing field, is video.
    pub fn from_marker(marker: Option<&str>) -> Self {
        match marker {
            Some("photo") => MediaKind::Photo,
            _ => MediaKind::Video,
        }
    }

    /// Classify an upload by its MIME type; any `image/*` is a photo.
    pub fn from_mime(content_type: &Mime) -> Self {
        if content_type.type_() == mime::IMAGE {
            MediaKind::Photo
        } else {
            MediaKind::Video
        }
    }

    pub fn as_marker(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
        }
    }
}

/// One comment entry, classified at ingestion.
///
/// Older documents carry bare strings; current ones carry objects with
/// `userId`, `userName`, `text`, and `createdAt`. Anything else decodes to
/// an empty structured comment rather than poisoning the post.
#[derive(Debug, Clone, PartialEq)]
pub enum CommentRecord {
    Legacy(String),
    Structured {
        author_id: Option<String>,
        author_name: Option<String>,
        text: String,
        created_at: Option<DateTime<Utc>>,
    },
}

impl CommentRecord {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(text) => CommentRecord::Legacy(text.clone()),
            Value::Object(map) => CommentRecord::Structured {
                author_id: non_empty_string(map.get(fields::USER_ID)),
                author_name: non_empty_string(map.get(fields::USER_NAME)),
                text: map
                    .get(fields::TEXT)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                created_at: parse_timestamp(map.get(fields::CREATED_AT)),
            },
            _ => CommentRecord::Structured {
                author_id: None,
                author_name: None,
                text: String::new(),
                created_at: None,
            },
        }
    }

    /// Display name for the comment author; legacy and anonymous comments
    /// fall back to a generic label.
    pub fn author_label(&self) -> &str {
        match self {
            CommentRecord::Legacy(_) => "User",
            CommentRecord::Structured {
                author_name: Some(name),
                ..
            } => name,
            CommentRecord::Structured {
                author_name: None, ..
            } => "User",
        }
    }

    pub fn text(&self) -> &str {
        match self {
            CommentRecord::Legacy(text) => text,
            CommentRecord::Structured { text, .. } => text,
        }
    }
}

/// A post as ingested from the document store.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub id: String,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub media_url: String,
    pub media_kind: MediaKind,
    pub created_at: Option<DateTime<Utc>>,
    pub likes: Vec<String>,
    pub comments: Vec<CommentRecord>,
}

impl PostRecord {
    pub fn from_document(doc: &Document) -> Self {
        let likes = doc
            .field(fields::LIKES)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let comments = doc
            .field(fields::COMMENTS)
            .and_then(Value::as_array)
            .map(|items| items.iter().map(CommentRecord::from_value).collect())
            .unwrap_or_default();

        PostRecord {
            id: doc.id.clone(),
            user_id: non_empty_string(doc.field(fields::USER_ID)),
            user_name: non_empty_string(doc.field(fields::USER_NAME)),
            media_url: doc
                .field(fields::MEDIA_URL)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            media_kind: MediaKind::from_marker(
                doc.field(fields::MEDIA_TYPE).and_then(Value::as_str),
            ),
            created_at: parse_timestamp(doc.field(fields::CREATED_AT)),
            likes,
            comments,
        }
    }

    pub fn liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|liker| liker == user_id)
    }
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|raw| !raw.is_empty())
        .map(str::to_owned)
}

fn parse_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
}

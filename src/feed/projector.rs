//! Pure projection of post records into render-ready view models.

use serde::Serialize;

use crate::models::{CommentRecord, MediaKind, PostRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentView {
    pub author_name: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostView {
    pub id: String,
    pub author_name: String,
    pub media_url: String,
    pub media_kind: MediaKind,
    pub like_count: usize,
    pub liked: bool,
    pub comments: Vec<CommentView>,
}

/// Project records into view models as seen by `current_user`, or by an
/// anonymous viewer when `None`.
///
/// Pure and order-preserving: equal inputs produce equal output in the
/// input's order, with no reordering or filtering.
pub fn project(posts: &[PostRecord], current_user: Option<&str>) -> Vec<PostView> {
    posts
        .iter()
        .map(|post| project_post(post, current_user))
        .collect()
}

fn project_post(post: &PostRecord, current_user: Option<&str>) -> PostView {
    PostView {
        id: post.id.clone(),
        author_name: post
            .user_name
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        media_url: post.media_url.clone(),
        media_kind: post.media_kind,
        like_count: post.likes.len(),
        liked: current_user.map(|uid| post.liked_by(uid)).unwrap_or(false),
        comments: post.comments.iter().map(project_comment).collect(),
    }
}

fn project_comment(comment: &CommentRecord) -> CommentView {
    CommentView {
        author_name: comment.author_label().to_string(),
        text: comment.text().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, user_name: Option<&str>, likes: &[&str]) -> PostRecord {
        PostRecord {
            id: id.into(),
            user_id: None,
            user_name: user_name.map(str::to_owned),
            media_url: format!("https://media.local/{id}.png"),
            media_kind: MediaKind::Photo,
            created_at: None,
            likes: likes.iter().map(|s| s.to_string()).collect(),
            comments: Vec::new(),
        }
    }

    #[test]
    fn preserves_order_and_is_deterministic() {
        let posts = vec![
            record("p1", Some("Ada"), &["u2"]),
            record("p2", Some("Eve"), &[]),
        ];

        let first = project(&posts, Some("u2"));
        let second = project(&posts, Some("u2"));
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].id, "p1");
        assert_eq!(first[1].id, "p2");
    }

    #[test]
    fn liked_reflects_membership_for_current_user_only() {
        let posts = vec![record("p1", Some("Ada"), &["u2", "u3"])];

        let as_liker = project(&posts, Some("u2"));
        assert!(as_liker[0].liked);
        assert_eq!(as_liker[0].like_count, 2);

        let as_other = project(&posts, Some("u9"));
        assert!(!as_other[0].liked);
        assert_eq!(as_other[0].like_count, 2);
    }

    #[test]
    fn anonymous_viewer_is_never_liked() {
        let posts = vec![record("p1", Some("Ada"), &["u2"])];
        let views = project(&posts, None);
        assert!(!views[0].liked);
        assert_eq!(views[0].like_count, 1);
    }

    #[test]
    fn missing_author_name_falls_back_to_unknown() {
        let posts = vec![record("p1", None, &[])];
        let views = project(&posts, None);
        assert_eq!(views[0].author_name, "Unknown");
    }

    #[test]
    fn comments_project_with_author_fallbacks() {
        let mut post = record("p1", Some("Ada"), &[]);
        post.comments = vec![
            CommentRecord::Legacy("first!".into()),
            CommentRecord::Structured {
                author_id: Some("u2".into()),
                author_name: Some("Eve".into()),
                text: "hi".into(),
                created_at: None,
            },
            CommentRecord::Structured {
                author_id: None,
                author_name: None,
                text: "anon".into(),
                created_at: None,
            },
        ];

        let views = project(&[post], None);
        let comments = &views[0].comments;
        assert_eq!(comments[0], CommentView { author_name: "User".into(), text: "first!".into() });
        assert_eq!(comments[1], CommentView { author_name: "Eve".into(), text: "hi".into() });
        assert_eq!(comments[2], CommentView { author_name: "User".into(), text: "anon".into() });
    }

    #[test]
    fn defaulted_record_projects_without_error() {
        let post = PostRecord {
            id: "p1".into(),
            user_id: None,
            user_name: None,
            media_url: String::new(),
            media_kind: MediaKind::Video,
            created_at: None,
            likes: Vec::new(),
            comments: Vec::new(),
        };

        let views = project(&[post], Some("u1"));
        assert_eq!(views[0].author_name, "Unknown");
        assert_eq!(views[0].media_kind, MediaKind::Video);
        assert_eq!(views[0].like_count, 0);
        assert!(!views[0].liked);
    }
}

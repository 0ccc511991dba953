//! HTML rendering for the feed page.
//!
//! Every user-authored string passes through [`escape_html`] before it is
//! written into markup. Post ids in form actions are store-issued and go in
//! raw; media URLs are escaped like any other user-influenced value.

use std::fmt::Write as _;

use crate::auth::Identity;
use crate::feed::{FeedState, PostView};
use crate::models::MediaKind;

/// Escape the three HTML-significant characters in user text.
///
/// `&` becomes `&amp;`, `<` becomes `&lt;`, `>` becomes `&gt;`. Everything
/// else is copied through unchanged, in one pass.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Render the post list fragment.
pub fn render_feed(posts: &[PostView]) -> String {
    let mut html = String::new();
    for post in posts {
        render_post(&mut html, post);
    }
    html
}

fn render_post(html: &mut String, post: &PostView) {
    let _ = writeln!(html, r#"<div class="post-item">"#);
    let _ = writeln!(
        html,
        "<p><b>{}</b> posted:</p>",
        escape_html(&post.author_name)
    );

    let media_url = escape_html(&post.media_url);
    match post.media_kind {
        MediaKind::Photo => {
            let _ = writeln!(html, r#"<img src="{media_url}" alt="">"#);
        }
        MediaKind::Video => {
            let _ = writeln!(html, r#"<video src="{media_url}" controls></video>"#);
        }
    }

    let (heart, like_action) = if post.liked {
        ("\u{2764}\u{fe0f}", "unlike")
    } else {
        ("\u{1f90d}", "like")
    };
    let _ = writeln!(html, r#"<div class="post-actions">"#);
    let _ = writeln!(
        html,
        r#"<form method="post" action="/posts/{}/{}"><button type="submit">{} {}</button></form>"#,
        post.id, like_action, heart, post.like_count
    );
    let _ = writeln!(html, "</div>");

    let _ = writeln!(html, r#"<div class="comments">"#);
    let _ = writeln!(html, "<h4>Comments</h4>");
    for comment in &post.comments {
        let _ = writeln!(
            html,
            "<p><b>{}:</b> {}</p>",
            escape_html(&comment.author_name),
            escape_html(&comment.text)
        );
    }
    let _ = writeln!(
        html,
        r#"<form method="post" action="/posts/{}/comments"><input type="text" name="text" placeholder="Write a comment..." required><button type="submit">Comment</button></form>"#,
        post.id
    );
    let _ = writeln!(html, "</div>");
    let _ = writeln!(html, "</div>");
}

/// Render the full feed page for the current viewer.
pub fn render_page(feed: &FeedState, viewer: Option<&Identity>) -> String {
    let mut html = String::new();
    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(html, r#"<html lang="en">"#);
    let _ = writeln!(
        html,
        r#"<head><meta charset="utf-8"><title>Photofeed</title></head>"#
    );
    let _ = writeln!(html, "<body>");
    let _ = writeln!(html, "<header>");
    let _ = writeln!(html, "<h1>Photofeed</h1>");

    match viewer {
        Some(identity) => {
            let _ = writeln!(
                html,
                "<p>Signed in as <b>{}</b></p>",
                escape_html(identity.display_label())
            );
            let _ = writeln!(
                html,
                r#"<form method="post" action="/session/sign-out"><button type="submit">Sign out</button></form>"#
            );
        }
        None => {
            let _ = writeln!(
                html,
                r#"<form method="post" action="/session/sign-in"><button type="submit">Sign in</button></form>"#
            );
        }
    }
    let _ = writeln!(html, "</header>");

    if viewer.is_some() {
        let _ = writeln!(
            html,
            r#"<form method="post" action="/posts" enctype="multipart/form-data"><input type="file" name="media" accept="image/*,video/*" required><button type="submit">Share</button></form>"#
        );
    }

    if !feed.live {
        let _ = writeln!(
            html,
            r#"<p class="stale-notice">Live updates interrupted. Showing the last loaded feed.</p>"#
        );
    }

    let _ = writeln!(html, r#"<main id="feed">"#);
    html.push_str(&render_feed(&feed.posts));
    let _ = writeln!(html, "</main>");
    let _ = writeln!(html, "</body>");
    let _ = writeln!(html, "</html>");
    html
}

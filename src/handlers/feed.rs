//! Feed page and JSON feed.

use actix_web::{get, web, HttpResponse};

use crate::error::AppError;
use crate::render;
use crate::state::AppState;

#[get("/")]
pub async fn index(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let feed = state.feed.borrow().clone();
    let viewer = state.auth.current_identity();
    let html = render::render_page(&feed, viewer.as_ref());
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}

/// Current projected feed as JSON, for programmatic consumers.
#[get("/api/feed")]
pub async fn feed_json(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let feed = state.feed.borrow().clone();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "revision": feed.revision,
        "live": feed.live,
        "posts": feed.posts,
    })))
}

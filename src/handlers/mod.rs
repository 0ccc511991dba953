//! HTTP request handlers.

pub mod feed;
pub mod posts;
pub mod session;

use actix_web::http::header;
use actix_web::HttpResponse;

pub use feed::{feed_json, index};
pub use posts::{add_comment, like_post, unlike_post, upload_post};
pub use session::{sign_in, sign_out};

/// Form posts bounce back to the feed page once the mutation lands.
pub(crate) fn redirect_to_feed() -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/"))
        .finish()
}

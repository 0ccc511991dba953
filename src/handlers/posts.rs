//! Post mutations submitted from the feed page.

use actix_multipart::Multipart;
use actix_web::{post, web, HttpResponse};
use futures_util::TryStreamExt;
use serde::Deserialize;

use crate::error::AppError;
use crate::services::NewUpload;
use crate::state::AppState;

use super::redirect_to_feed;

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[post("/posts")]
pub async fn upload_post(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    // Reject signed-out requests before buffering the body.
    if state.auth.current_identity().is_none() {
        return Err(AppError::Precondition("sign in to upload".into()));
    }
    let upload = read_upload(payload).await?;
    let post_id = state.posts.create_post(upload).await?;
    tracing::debug!(post_id = %post_id, "upload accepted");
    Ok(redirect_to_feed())
}

#[post("/posts/{id}/like")]
pub async fn like_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let post_id = path.into_inner();
    state.posts.like(&post_id).await?;
    Ok(redirect_to_feed())
}

#[post("/posts/{id}/unlike")]
pub async fn unlike_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let post_id = path.into_inner();
    state.posts.unlike(&post_id).await?;
    Ok(redirect_to_feed())
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub text: String,
}

#[post("/posts/{id}/comments")]
pub async fn add_comment(
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse, AppError> {
    let post_id = path.into_inner();
    state.posts.add_comment(&post_id, &form.text).await?;
    Ok(redirect_to_feed())
}

/// Pull the first file field out of the multipart form, holding the body
/// to the upload size cap.
async fn read_upload(mut payload: Multipart) -> Result<NewUpload, AppError> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|err| AppError::BadRequest(format!("invalid multipart payload: {err}")))?
    {
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned);
        let Some(file_name) = file_name else {
            continue;
        };

        let content_type = field
            .content_type()
            .cloned()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM);

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|err| AppError::BadRequest(format!("failed to read upload: {err}")))?
        {
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(AppError::PayloadTooLarge(format!(
                    "upload exceeds the {}MB limit",
                    MAX_UPLOAD_BYTES / (1024 * 1024)
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        return Ok(NewUpload {
            file_name,
            content_type,
            bytes,
        });
    }

    Err(AppError::BadRequest("choose a file first".into()))
}

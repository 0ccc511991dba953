//! Sign-in and sign-out.

use actix_web::{post, web, HttpResponse};

use crate::error::AppError;
use crate::state::AppState;

use super::redirect_to_feed;

#[post("/session/sign-in")]
pub async fn sign_in(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    state.auth.sign_in().await?;
    Ok(redirect_to_feed())
}

#[post("/session/sign-out")]
pub async fn sign_out(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    state.auth.sign_out().await;
    Ok(redirect_to_feed())
}

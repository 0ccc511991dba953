//! Photofeed: a live photo/video feed client.
//!
//! The crate wires four collaborator seams together: an identity provider,
//! a document store, a media store, and an HTML renderer. A
//! [`feed::FeedView`] owns the store subscription and keeps a projected
//! feed state current; [`services::PostService`] issues the mutations.

pub mod auth;
pub mod config;
pub mod error;
pub mod feed;
pub mod handlers;
pub mod logging;
pub mod media;
pub mod metrics;
pub mod models;
pub mod render;
pub mod services;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};

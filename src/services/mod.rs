//! Application services coordinating the collaborator seams.

pub mod posts;

pub use posts::{NewUpload, PostService};

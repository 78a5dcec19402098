//! HTTP API layer for quill.
//!
//! This crate exposes the blog over JSON:
//!
//! - **Endpoints**: posts, comments, reactions, categories, tags, accounts
//! - **Extractors**: bearer-token authentication
//! - **Middleware**: token resolution into an [`quill_core::Actor`]
//!
//! Built on Axum 0.8. Every route is meant to be nested under `/api`.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;

//! Core business logic for quill.
//!
//! Services own the rules: who may write what, how slugs and publication
//! timestamps are assigned, how comments thread and how reactions toggle.
//! They sit between the HTTP layer and the repositories in `quill-db`.

pub mod services;

pub use services::*;

//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use quill_common::AppError;
use quill_core::Actor;

/// Authenticated requester, as resolved by
/// [`auth_middleware`](crate::middleware::auth_middleware).
#[derive(Debug, Clone)]
pub struct AuthUser(pub Actor);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional authenticated requester.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<Actor>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Actor>().cloned()))
    }
}

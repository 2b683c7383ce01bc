use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::claims::Principal;
use crate::error::AppError;

/// The principal that [`authorize`](super::guard::authorize) attached to the request.
pub struct AuthUser(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthorized("Unauthorized".into()))
    }
}

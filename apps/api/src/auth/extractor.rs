use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::auth::queries::user_for_token;
use crate::errors::AppError;

/// The caller behind `Authorization: Bearer <token>`.
///
/// Rejects with 401 when the header is missing or malformed, or the token is
/// unknown or expired. Use `Option<CurrentUser>` where a session is optional.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    PgPool: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;

        let pool = PgPool::from_ref(state);
        let user = user_for_token(&pool, token)
            .await?
            .ok_or_else(|| {
                debug!("Rejected unknown or expired session token");
                AppError::Unauthorized
            })?;

        Ok(CurrentUser { id: user.id })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

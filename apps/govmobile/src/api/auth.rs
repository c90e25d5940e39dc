//! Bearer-token extraction and sign-in rate limiting.

use crate::error::AppError;
use crate::store::Session;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::DefaultDirectRateLimiter;
use std::sync::Arc;

/// The caller's session, from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct Bearer(pub Session);

impl<S: Send + Sync> FromRequestParts<S> for Bearer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthorized)?;

        Ok(Bearer(Session::new(token)))
    }
}

/// Reject the request once the shared sign-in quota is spent.
pub async fn rate_limit(
    State(limiter): State<Arc<DefaultDirectRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if limiter.check().is_err() {
        tracing::warn!(path = %request.uri().path(), "sign-in rate limit exceeded");
        return AppError::RateLimited.into_response();
    }
    next.run(request).await
}

//! HTTP error type.
//!
//! Every failure leaves the API as JSON: `{"error": "...", "fields": {...},
//! "redirect": "/Page?..."}`, the last two only when they apply.

use crate::portal::PortalError;
use crate::store::StoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use govmobile_core::demo::INVALID_DEMO_CODE;
use govmobile_core::directory::DirectoryError;
use govmobile_core::page::Redirect;
use govmobile_core::validation::FieldErrors;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("authentication required")]
    Unauthorized,

    #[error("{}", INVALID_DEMO_CODE)]
    InvalidDemoCode,

    #[error("demo mode is disabled")]
    DemoDisabled,

    #[error("too many requests, slow down")]
    RateLimited,

    #[error(transparent)]
    Portal(#[from] PortalError),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<&'a Redirect>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidDemoCode => StatusCode::UNAUTHORIZED,
            AppError::DemoDisabled => StatusCode::NOT_FOUND,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Portal(e) => match e {
                PortalError::Unauthenticated => StatusCode::UNAUTHORIZED,
                PortalError::Missing { .. } => StatusCode::NOT_FOUND,
                PortalError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
                PortalError::BadQuery(_) => StatusCode::BAD_REQUEST,
                PortalError::NotEligible => StatusCode::FORBIDDEN,
                PortalError::Unavailable => StatusCode::CONFLICT,
                PortalError::Denied(DirectoryError::NotFound) => StatusCode::NOT_FOUND,
                PortalError::Denied(DirectoryError::NotEmployee) => StatusCode::FORBIDDEN,
                PortalError::Failed { source, .. } => match source {
                    StoreError::Invalid(_) => StatusCode::BAD_REQUEST,
                    StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                    StoreError::Unsupported { .. } => StatusCode::NOT_IMPLEMENTED,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                },
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (fields, redirect) = match &self {
            AppError::Portal(PortalError::Invalid(fields)) => (Some(fields), None),
            AppError::Portal(PortalError::Missing { redirect, .. }) => (None, Some(redirect)),
            _ => (None, None),
        };
        let body = ErrorBody {
            error: self.to_string(),
            fields,
            redirect,
        };

        (status, Json(body)).into_response()
    }
}

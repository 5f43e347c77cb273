//! API error type and status mapping
//!
//! Handlers return [`ApiError`]; the mapping to HTTP status lives in one
//! place so the taxonomy stays consistent across endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pivot_core::PivotError;
use pivot_engine::StoreError;
use serde_json::json;
use thiserror::Error;

/// Failures a handler can surface to the client
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed indicator or request parameters
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No authenticated user could be established
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The caller lacks a required role
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The referenced document does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Anything the client cannot fix
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<PivotError> for ApiError {
    fn from(err: PivotError) -> Self {
        match err {
            PivotError::Validation(msg) => ApiError::BadRequest(msg),
            PivotError::Authorization(msg) => ApiError::Forbidden(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ApiError::NotFound(format!("link group {id}")),
            StoreError::Forbidden(id) => ApiError::Forbidden(format!("link group {id}")),
            StoreError::Duplicate(id) => {
                ApiError::BadRequest(format!("link group {id} already exists"))
            }
        }
    }
}

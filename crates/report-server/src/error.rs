//! API error type and response mapping

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use report_tasks::ReportError;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced as non-200 responses
///
/// Body shapes follow the public contract: 400/404 carry `{"error"}`,
/// 401 carries `{"message"}`, and 500 carries `{"status", "error"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid request input
    #[error("{0}")]
    BadRequest(String),

    /// Authentication failure
    #[error("{0}")]
    Unauthorized(String),

    /// The requested entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// Unexpected failure
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({"error": message}))).into_response()
            }
            ApiError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, Json(json!({"message": message}))).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({"error": message}))).into_response()
            }
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"status": "error", "error": message})),
            )
                .into_response(),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(error: ReportError) -> Self {
        match error {
            ReportError::CompanyProfileNotFound => {
                ApiError::NotFound("company_profile_not_found".to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<crate::store::StoreError> for ApiError {
    fn from(error: crate::store::StoreError) -> Self {
        ApiError::Internal(error.to_string())
    }
}

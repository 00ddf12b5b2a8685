//! Error types for lyrics-api
//!
//! Every handler error is rendered as
//! `{"error": {"code": "...", "message": "..."}}` with the status below.
//!
//! | variant | status |
//! |---------|--------|
//! | `Validation` | 422 |
//! | `NotFound` | 404 |
//! | `BadRequest` | 400 |
//! | `Store` during insert | 404 |
//! | `Store` otherwise | 500 |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::StoreOp;
use crate::service::SongError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or incomplete request body (422)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Record store failure
    #[error("Store {op} failed: {message}")]
    Store { op: StoreOp, message: String },
}

impl From<SongError> for ApiError {
    fn from(err: SongError) -> Self {
        match err {
            SongError::Validation(msg) => ApiError::Validation(msg),
            e @ SongError::NotFound(_) => ApiError::NotFound(e.to_string()),
            e @ SongError::BadRequest(_) => ApiError::BadRequest(e.to_string()),
            SongError::Store { op, source } => ApiError::Store {
                op,
                message: source.to_string(),
            },
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            // Insert failures have always been answered with 404
            ApiError::Store {
                op: StoreOp::Insert,
                ..
            } => StatusCode::NOT_FOUND,
            ApiError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Store { .. } => "STORE_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

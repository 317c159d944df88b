//! HTTP error type for the resolver API
//!
//! Errors render as the same envelope as successful responses:
//! `{"errors": [msg], "found": false, "records": []}`.

use ariadne_common::api::ResolverResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::coverage::CoverageError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request could not be resolved (400)
    #[error("{0}")]
    BadRequest(String),

    /// Unexpected failure inside the resolution (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CoverageError> for ApiError {
    fn from(e: CoverageError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        error!(status = status.as_u16(), error = %message, "Rejecting request");

        (status, Json(ResolverResponse::error(message))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

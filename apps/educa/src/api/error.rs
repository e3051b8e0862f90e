//! # API Errors
//!
//! Every handler returns `Result<_, ApiError>`; the error renders as
//! `{"error": "..."}` with the matching status code.

use super::types::ErrorResponse;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use educa_core::EducaError;
use thiserror::Error;

/// Challenge sent with every 401 from the user endpoints.
const BASIC_CHALLENGE: &str = r#"Basic realm="educa""#;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] EducaError),

    /// Missing or invalid credentials.
    #[error("Authentication credentials were not provided or are invalid")]
    Unauthorized,

    /// Malformed request the core never saw.
    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Core(EducaError::Validation(_)) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Core(EducaError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Core(EducaError::Forbidden) => StatusCode::FORBIDDEN,
            Self::Core(EducaError::Conflict(_) | EducaError::Protected(_)) => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Core(EducaError::Serialization(_) | EducaError::Io(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(event = "request_failed", error = %self, "Request failed");
        }
        let mut response = (status, Json(ErrorResponse::new(self.to_string()))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(BASIC_CHALLENGE),
            );
        }
        response
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! API error type and its HTTP mapping
//!
//! Every error body has the shape `{"error": {"code": ..., "message": ...}}`;
//! validation failures add `"fields"` with the per-field messages.

use crate::store::StoreError;
use crate::submission::SubmitError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sdir_common::ValidationErrors;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Submitted form has invalid fields (422)
    #[error("{message}")]
    Validation {
        message: String,
        fields: ValidationErrors,
    },

    /// Write endpoint rejected or failed the append (502)
    #[error("{0}")]
    Append(String),

    /// No write endpoint is configured (503)
    #[error("{0}")]
    Configuration(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        let message = err.to_string();
        match err {
            SubmitError::Validation(fields) => ApiError::Validation { message, fields },
            SubmitError::Store(store) => store.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Append(msg) => ApiError::Append(msg),
            StoreError::Configuration(msg) => ApiError::Configuration(msg),
            // Reads fall back to sample data, so a fetch error here is unexpected
            StoreError::Fetch(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<sdir_common::Error> for ApiError {
    fn from(err: sdir_common::Error) -> Self {
        match err {
            sdir_common::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, fields) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            ApiError::Validation { message, fields } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_FAILED",
                message,
                Some(fields),
            ),
            ApiError::Append(msg) => (StatusCode::BAD_GATEWAY, "APPEND_FAILED", msg, None),
            ApiError::Configuration(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "NOT_CONFIGURED",
                msg,
                None,
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
                None,
            ),
        };

        let body = match fields {
            Some(fields) => json!({
                "error": { "code": error_code, "message": message },
                "fields": fields,
            }),
            None => json!({
                "error": { "code": error_code, "message": message },
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_status() {
        let cases = [
            (StoreError::Append("quota".into()), StatusCode::BAD_GATEWAY),
            (StoreError::Configuration("no url".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            let response = ApiError::from(SubmitError::Store(err)).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn test_validation_maps_to_422() {
        let err = ApiError::from(SubmitError::Validation(ValidationErrors::new()));
        assert_eq!(err.to_string(), "Please fix all validation errors before submitting");
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_invalid_input_is_bad_request() {
        let err = ApiError::from(sdir_common::Error::InvalidInput("member9.age".into()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}

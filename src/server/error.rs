//! Request-boundary errors and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::inference::classifier::ScoringError;

/// Message shared by every "body is not what we expect" rejection.
pub const NO_DATA_MESSAGE: &str = "No data provided or wrong format";

#[derive(Error, Debug)]
pub enum ApiError {
    /// Empty body, invalid JSON, or a falsy JSON value.
    #[error("No data provided or wrong format")]
    MalformedRequest,

    /// Valid JSON without a `data` field.
    #[error("No data provided or wrong format")]
    MissingField,

    /// `data` holds the wrong number of values.
    #[error("Input must contain exactly {expected} values")]
    InvalidLength { expected: usize, got: usize },

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedRequest
            | ApiError::MissingField
            | ApiError::InvalidLength { .. } => StatusCode::BAD_REQUEST,
            ApiError::Scoring(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

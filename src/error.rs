//! Unified error handling for the HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::StoreError;
use crate::validation::ValidationErrors;

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<ValidationErrors>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(#[source] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Map a store failure for the entity called `label`.
    pub fn from_store(err: StoreError, label: &str) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound(format!("{label} not found")),
            StoreError::Conflict(_) => Self::Conflict(format!("{label} already exists")),
            other => Self::Store(other),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::from_store(err, "Record")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            Self::Validation(fields) => ErrorResponse {
                error: "Validation failed".to_string(),
                fields: Some(fields),
            },
            Self::Store(err) => {
                tracing::error!(error = %err, source = ?std::error::Error::source(&err), "Store operation failed");
                ErrorResponse {
                    error: "Internal server error".to_string(),
                    fields: None,
                }
            }
            Self::Internal(message) => {
                tracing::error!(error = %message, "Request failed");
                ErrorResponse {
                    error: "Internal server error".to_string(),
                    fields: None,
                }
            }
            other => ErrorResponse {
                error: other.to_string(),
                fields: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

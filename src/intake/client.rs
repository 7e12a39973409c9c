//! HTTP sink that posts finished applications to `/api/applications`.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use super::ApplicationSink;
use crate::db::models::Application;
use crate::error::ErrorResponse;
use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum SubmitError {
    /// The server refused the record; field errors are shown inline.
    #[error("application rejected")]
    Rejected(ValidationErrors),
    #[error("server responded with {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct IntakeClient {
    client: reqwest::Client,
    endpoint: String,
}

impl IntakeClient {
    /// `base_url` is the backend origin, e.g. `http://127.0.0.1:3001`.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/api/applications", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl ApplicationSink for IntakeClient {
    async fn submit(&self, application: &Value) -> Result<Application, SubmitError> {
        let response = self.client.post(&self.endpoint).json(application).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<Application>().await?);
        }

        let body = response.json::<ErrorResponse>().await.ok();
        match body {
            Some(ErrorResponse {
                fields: Some(fields),
                ..
            }) if status == StatusCode::BAD_REQUEST => Err(SubmitError::Rejected(fields)),
            Some(body) => Err(SubmitError::Status {
                status,
                message: body.error,
            }),
            None => Err(SubmitError::Status {
                status,
                message: status.canonical_reason().unwrap_or("unknown").to_string(),
            }),
        }
    }
}

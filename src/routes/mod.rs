/**
 * Routes Module
 * API route handlers and the extractors they share
 */
pub mod admins;
pub mod auth;
pub mod blog;
pub mod health;
pub mod leads;
pub mod resource;
pub mod socials;

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::validation::Validate;

/// Success response (for delete and logout)
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// JSON body that has passed its schema. Handlers never see the raw body.
pub struct Valid<T>(pub T);

impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: Validate + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(raw) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        Ok(Self(T::from_json(&raw)?))
    }
}

/// Ids that are not UUIDs cannot exist, so they are reported as not found.
pub fn parse_id(raw: &str, label: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("{label} not found")))
}

/**
 * Lead Routes
 * Public application and order forms; each new lead is forwarded to the bot
 */
use axum::{extract::State, http::StatusCode, Json};

use crate::error::{ApiError, ApiResult};
use crate::notify::{Lead, LeadEvent};
use crate::routes::Valid;
use crate::state::AppState;

/// POST /api/applications, POST /api/orders
///
/// The notification is sent only after the record is stored, and its outcome
/// never affects the response.
pub async fn create_lead<R: Lead>(
    State(state): State<AppState>,
    Valid(input): Valid<R::Input>,
) -> ApiResult<(StatusCode, Json<R>)> {
    let lead = R::repository(state.store())
        .create(input)
        .await
        .map_err(|e| ApiError::from_store(e, R::LABEL))?;

    tracing::info!(kind = R::KIND.as_str(), id = %lead.id(), "New lead received");

    match LeadEvent::from_lead(&lead) {
        Ok(event) => state.notifier().notify(event),
        Err(e) => tracing::warn!(error = %e, "Could not build lead notification"),
    }

    Ok((StatusCode::CREATED, Json(lead)))
}

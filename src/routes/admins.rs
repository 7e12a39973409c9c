/**
 * Admin Account Routes
 * Dashboard account management; password hashes never leave the store
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::db::models::{Admin, AdminForm, NewAdmin};
use crate::db::{Store, StoreError};
use crate::error::{ApiError, ApiResult};
use crate::routes::auth::{hash_password, AdminSession};
use crate::routes::{parse_id, SuccessResponse, Valid};
use crate::state::AppState;

/// Hash the password and insert the account. Shared by the API, startup
/// bootstrap and the CLI tools.
pub async fn create_account(store: &dyn Store, form: AdminForm, cost: u32) -> ApiResult<Admin> {
    let password_hash = hash_password(form.password, cost).await?;

    store
        .admins()
        .create(NewAdmin {
            email: form.email,
            name: form.name,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => {
                ApiError::Conflict("Admin with this email already exists".to_string())
            }
            other => ApiError::from_store(other, "Admin"),
        })
}

/// GET /api/admin/admins
pub async fn list_admins(
    _session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Admin>>> {
    let admins = state
        .store()
        .admins()
        .list()
        .await
        .map_err(|e| ApiError::from_store(e, "Admin"))?;
    Ok(Json(admins))
}

/// POST /api/admin/admins
pub async fn create_admin(
    session: AdminSession,
    State(state): State<AppState>,
    Valid(form): Valid<AdminForm>,
) -> ApiResult<(StatusCode, Json<Admin>)> {
    let admin = create_account(state.store(), form, state.config().bcrypt_cost).await?;

    tracing::info!(admin_id = %admin.id, created_by = %session.id, "Admin account created");
    Ok((StatusCode::CREATED, Json(admin)))
}

/// DELETE /api/admin/admins/{id}
pub async fn delete_admin(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let id = parse_id(&id, "Admin")?;
    if id == session.id {
        return Err(ApiError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    state
        .store()
        .admins()
        .delete(id)
        .await
        .map_err(|e| ApiError::from_store(e, "Admin"))?;

    tracing::info!(admin_id = %id, deleted_by = %session.id, "Admin account deleted");
    Ok(SuccessResponse::ok())
}

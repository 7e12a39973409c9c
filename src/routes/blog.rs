/**
 * Blog Routes
 * Public blog listing with an optional published filter
 */
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;

use crate::db::models::BlogPost;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Query parameters for GET /api/blog
#[derive(Debug, Default, Deserialize)]
pub struct BlogListQuery {
    pub published: Option<bool>,
}

/// GET /api/blog - every post, newest first, optionally filtered by `published`
pub async fn list_posts(
    State(state): State<AppState>,
    query: Result<Query<BlogListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<BlogPost>>> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let mut posts = state
        .store()
        .blog()
        .list()
        .await
        .map_err(|e| ApiError::from_store(e, "Blog post"))?;

    if let Some(published) = query.published {
        posts.retain(|p| p.published == published);
    }

    Ok(Json(posts))
}

//! Role-gated link group CRUD endpoints

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pivot_core::LinkGroup;
use serde_json::json;

/// GET /api/linkGroup/getViewable
pub async fn get_viewable(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user = state.auth.authenticate(&headers).await?;
    let groups = state.link_groups.viewable(&user).await?;
    Ok(Json(json!({ "linkGroups": groups })).into_response())
}

/// GET /api/linkGroup/getEditable
pub async fn get_editable(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user = state.auth.authenticate(&headers).await?;
    let groups = state.link_groups.editable(&user).await?;
    Ok(Json(json!({ "linkGroups": groups })).into_response())
}

/// PUT /api/linkGroup — create a group; the caller becomes its creator
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut group): Json<LinkGroup>,
) -> Result<Response, ApiError> {
    let user = state.auth.authenticate(&headers).await?;
    if group.id.is_empty() {
        return Err(ApiError::BadRequest("link group id must not be empty".into()));
    }
    group.creator = user.user_id;
    state.link_groups.create(group).await?;
    Ok(Json(json!({ "success": true })).into_response())
}

/// PUT /api/linkGroup/:id — replace a group the caller can edit
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(group): Json<LinkGroup>,
) -> Result<Response, ApiError> {
    let user = state.auth.authenticate(&headers).await?;
    state.link_groups.update(&id, group, &user).await?;
    Ok(Json(json!({ "success": true })).into_response())
}

/// DELETE /api/linkGroup/:id — delete a group the caller can edit
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user = state.auth.authenticate(&headers).await?;
    state.link_groups.delete(&id, &user).await?;
    Ok(Json(json!({ "success": true })).into_response())
}

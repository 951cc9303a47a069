// handlers/elevated/boxes.rs - catalog management

use axum::extract::State;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::MysteryBox;
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult};
use crate::services::catalog::{BoxInput, BoxPatch, BoxQuery};
use crate::types::Page;

/// GET /api/admin/boxes - same filters as the storefront plus `active=true|false`
pub async fn list(State(state): State<AppState>, ApiQuery(query): ApiQuery<BoxQuery>) -> ApiResult<Page<MysteryBox>> {
    Ok(ApiResponse::success(state.services.catalog.admin_list(&query).await?))
}

/**
 * POST /api/admin/boxes - create a box
 *
 * The slug is derived from the name when omitted. A taken slug is a 409.
 */
pub async fn create(State(state): State<AppState>, ApiJson(input): ApiJson<BoxInput>) -> ApiResult<MysteryBox> {
    Ok(ApiResponse::created(state.services.catalog.create(input).await?))
}

/// GET /api/admin/boxes/:id - active or not
pub async fn show(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<MysteryBox> {
    Ok(ApiResponse::success(state.services.catalog.get(id).await?))
}

/// PUT /api/admin/boxes/:id - partial update
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<BoxPatch>,
) -> ApiResult<MysteryBox> {
    Ok(ApiResponse::success(state.services.catalog.update(id, patch).await?))
}

/// DELETE /api/admin/boxes/:id
pub async fn remove(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<Value> {
    state.services.catalog.delete(id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}

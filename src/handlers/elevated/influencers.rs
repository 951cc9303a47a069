// handlers/elevated/influencers.rs - influencer registry

use axum::extract::State;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::Influencer;
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult};
use crate::services::influencers::{InfluencerInput, InfluencerListing, InfluencerPatch, InfluencerQuery};

/**
 * GET /api/admin/influencers - filtered listing with counts per status
 *
 * Query: status, platform, category, search, sort (newest|followers|engagement|sales), page, limit
 */
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<InfluencerQuery>,
) -> ApiResult<InfluencerListing> {
    Ok(ApiResponse::success(state.services.influencers.list(&query).await?))
}

/// POST /api/admin/influencers - defaults to `active`
pub async fn create(State(state): State<AppState>, ApiJson(input): ApiJson<InfluencerInput>) -> ApiResult<Influencer> {
    Ok(ApiResponse::created(state.services.influencers.create(input).await?))
}

/// GET /api/admin/influencers/:id
pub async fn show(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<Influencer> {
    Ok(ApiResponse::success(state.services.influencers.get(id).await?))
}

/// PUT /api/admin/influencers/:id - partial update, status included
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<InfluencerPatch>,
) -> ApiResult<Influencer> {
    Ok(ApiResponse::success(state.services.influencers.update(id, patch).await?))
}

/// DELETE /api/admin/influencers/:id
pub async fn remove(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<Value> {
    state.services.influencers.delete(id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}

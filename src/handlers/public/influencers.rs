// handlers/public/influencers.rs - influencer program application

use axum::extract::State;

use crate::app::AppState;
use crate::database::models::Influencer;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::influencers::InfluencerInput;

/// POST /api/influencers - always lands as `pending`; any status in the body is ignored
pub async fn apply(State(state): State<AppState>, ApiJson(input): ApiJson<InfluencerInput>) -> ApiResult<Influencer> {
    let influencer = state.services.influencers.apply(input).await?;
    Ok(ApiResponse::created(influencer))
}

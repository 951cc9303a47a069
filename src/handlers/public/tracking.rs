// handlers/public/tracking.rs - shipment tracking by order id, order number or tracking number

use axum::extract::State;

use crate::app::AppState;
use crate::middleware::{ApiPath, ApiResponse, ApiResult};
use crate::services::orders::TrackingInfo;

/// GET /api/orders/:id/tracking - `:id` may be a UUID, `ST-...` or `TRK...`
pub async fn show(State(state): State<AppState>, ApiPath(key): ApiPath<String>) -> ApiResult<TrackingInfo> {
    Ok(ApiResponse::success(state.services.orders.tracking(&key).await?))
}

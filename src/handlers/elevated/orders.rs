// handlers/elevated/orders.rs - order desk and tracking updates

use axum::extract::State;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::Order;
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult};
use crate::services::orders::{OrderQuery, TrackingUpdate};
use crate::types::Page;

/// GET /api/admin/orders?status=&search=&user_id=&page=&limit=
pub async fn list(State(state): State<AppState>, ApiQuery(query): ApiQuery<OrderQuery>) -> ApiResult<Page<Order>> {
    Ok(ApiResponse::success(state.services.orders.list(&query).await?))
}

/// GET /api/admin/orders/:id
pub async fn show(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<Order> {
    Ok(ApiResponse::success(state.services.orders.lookup(&id.to_string()).await?))
}

/**
 * POST /api/orders/:id/tracking - append a timeline entry
 *
 * Input: `{ "status", "location"?, "description"?, "timestamp"? }`
 * `:id` may be the order id, order number or tracking number. Moves the
 * state machine cannot make are a 409.
 */
pub async fn append_tracking(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
    ApiJson(update): ApiJson<TrackingUpdate>,
) -> ApiResult<Order> {
    let order = state.services.orders.append_tracking_update(&key, update).await?;
    Ok(ApiResponse::success(order))
}

// handlers/protected/orders.rs - checkout and the caller's order history

use axum::{extract::State, Extension};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::Order;
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::services::orders::{CheckoutRequest, OrderQuery};
use crate::types::Page;

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

/**
 * POST /api/user/checkout - turn the cart into an order
 *
 * Input:
 * ```json
 * {
 *   "shipping_address_id": "uuid",
 *   "billing_address_id": "uuid",   // optional, defaults to shipping
 *   "payment_method": "cod|upi|card|net_banking|wallet",
 *   "delivery": "standard|express"  // optional
 * }
 * ```
 *
 * Stock, the new order and the emptied cart are written together.
 */
pub async fn checkout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> ApiResult<Order> {
    let order = state.services.orders.create_order(auth.user_id, request).await?;
    Ok(ApiResponse::created(order))
}

/// GET /api/user/orders?status=&page=&limit= - newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> ApiResult<Page<Order>> {
    Ok(ApiResponse::success(state.services.orders.list_for_user(auth.user_id, &query).await?))
}

/// GET /api/user/orders/:id - 403 for someone else's order
pub async fn show(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(order_id): ApiPath<Uuid>,
) -> ApiResult<Order> {
    Ok(ApiResponse::success(state.services.orders.get_for_user(auth.user_id, order_id).await?))
}

/// POST /api/user/orders/:id/cancel - `{ "reason"? }`; pending or processing only
pub async fn cancel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(order_id): ApiPath<Uuid>,
    body: Option<ApiJson<CancelRequest>>,
) -> ApiResult<Order> {
    let reason = body.and_then(|ApiJson(request)| request.reason);
    let order = state.services.orders.cancel(auth.user_id, order_id, reason).await?;
    Ok(ApiResponse::success(order))
}

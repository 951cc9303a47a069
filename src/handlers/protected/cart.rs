// handlers/protected/cart.rs - the caller's cart

use axum::{extract::State, Extension};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::services::cart::CartView;
use crate::types::DeliveryOption;

#[derive(Debug, Deserialize)]
pub struct CartQuery {
    #[serde(default)]
    pub delivery: DeliveryOption,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub box_id: Uuid,
    #[serde(default = "one")]
    pub quantity: i64,
}

fn one() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CouponRequest {
    pub code: Option<String>,
}

/// GET /api/user/cart?delivery=standard|express - totals derived fresh on every read
pub async fn show(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<CartQuery>,
) -> ApiResult<CartView> {
    Ok(ApiResponse::success(state.services.cart.get_cart(auth.user_id, query.delivery).await?))
}

/// POST /api/user/cart/items - `{ "box_id", "quantity"? }`; adds to an existing line
pub async fn add_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(request): ApiJson<AddItemRequest>,
) -> ApiResult<CartView> {
    let cart = state
        .services
        .cart
        .add_item(auth.user_id, request.box_id, request.quantity)
        .await?;
    Ok(ApiResponse::success(cart))
}

/// PUT /api/user/cart/items/:id - `{ "quantity" }`, at least 1
pub async fn update_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(item_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<QuantityRequest>,
) -> ApiResult<CartView> {
    let cart = state
        .services
        .cart
        .update_quantity(auth.user_id, item_id, request.quantity)
        .await?;
    Ok(ApiResponse::success(cart))
}

/// DELETE /api/user/cart/items/:id - succeeds even when the line is already gone
pub async fn remove_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(item_id): ApiPath<Uuid>,
) -> ApiResult<CartView> {
    Ok(ApiResponse::success(state.services.cart.remove_item(auth.user_id, item_id).await?))
}

/// DELETE /api/user/cart
pub async fn clear(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult<CartView> {
    let cart = &state.services.cart;
    cart.clear(auth.user_id).await?;
    Ok(ApiResponse::success(cart.get_cart(auth.user_id, DeliveryOption::Standard).await?))
}

/// POST /api/user/cart/coupon - `{ "code" }`
pub async fn apply_coupon(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(request): ApiJson<CouponRequest>,
) -> ApiResult<CartView> {
    let code = request
        .code
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::missing_field("code"))?;
    Ok(ApiResponse::success(state.services.cart.apply_coupon(auth.user_id, &code).await?))
}

/// DELETE /api/user/cart/coupon
pub async fn remove_coupon(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<CartView> {
    Ok(ApiResponse::success(state.services.cart.remove_coupon(auth.user_id).await?))
}

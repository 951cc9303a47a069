// handlers/public/pricing.rs - stateless price quotes

use axum::extract::State;
use serde::Deserialize;

use crate::app::AppState;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::pricing::PriceLine;
use crate::types::{DeliveryOption, PriceSummary};

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    #[serde(default)]
    pub items: Vec<PriceLine>,
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub delivery: DeliveryOption,
}

/**
 * POST /api/pricing/quote - price arbitrary lines without touching a cart
 *
 * Input: `{ "items": [{ "unit_price", "quantity" }], "coupon_code"?, "delivery"? }`
 * An unknown coupon, a negative price or an unrepresentable amount is a 400.
 */
pub async fn quote(State(state): State<AppState>, ApiJson(request): ApiJson<QuoteRequest>) -> ApiResult<PriceSummary> {
    let coupon = request.coupon_code.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let summary = state
        .services
        .pricing
        .compute_summary(&request.items, coupon, request.delivery)?;
    Ok(ApiResponse::success(summary))
}

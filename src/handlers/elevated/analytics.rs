// handlers/elevated/analytics.rs - GET /api/admin/analytics

use axum::extract::State;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::analytics::DashboardStats;

/// GET /api/admin/analytics - order, revenue, inventory, support and influencer aggregates
pub async fn dashboard(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    Ok(ApiResponse::success(state.services.analytics.dashboard().await?))
}

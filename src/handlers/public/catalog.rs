// handlers/public/catalog.rs - storefront browsing

use axum::extract::State;
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::{MysteryBox, Review};
use crate::middleware::{ApiPath, ApiQuery, ApiResponse, ApiResult};
use crate::services::catalog::BoxQuery;
use crate::types::Page;

#[derive(Debug, Deserialize)]
pub struct RelatedQuery {
    pub limit: Option<u32>,
}

/**
 * GET /api/boxes - active boxes, filtered, sorted and paged
 *
 * Query: category, occasion, gender, min_price, max_price, search,
 * sort (newest|price_asc|price_desc|rating|popular|name), page, limit
 */
pub async fn list(State(state): State<AppState>, ApiQuery(query): ApiQuery<BoxQuery>) -> ApiResult<Page<MysteryBox>> {
    let page = state.services.catalog.list(&query).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/boxes/:slug
pub async fn show(State(state): State<AppState>, ApiPath(slug): ApiPath<String>) -> ApiResult<MysteryBox> {
    Ok(ApiResponse::success(state.services.catalog.get_by_slug(&slug).await?))
}

/// GET /api/boxes/:slug/related - boxes sharing the category or occasion
pub async fn related(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
    ApiQuery(query): ApiQuery<RelatedQuery>,
) -> ApiResult<Vec<MysteryBox>> {
    Ok(ApiResponse::success(state.services.catalog.related(&slug, query.limit).await?))
}

/// GET /api/boxes/:slug/reviews
pub async fn reviews(State(state): State<AppState>, ApiPath(slug): ApiPath<String>) -> ApiResult<Vec<Review>> {
    Ok(ApiResponse::success(state.services.catalog.reviews(&slug).await?))
}

// handlers/protected/reviews.rs - POST /api/boxes/:slug/reviews

use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::database::models::MysteryBox;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::catalog::ReviewInput;

/**
 * POST /api/boxes/:slug/reviews - one review per user per box
 *
 * Input: `{ "rating": 1..5, "title"?, "comment"? }`
 * Output: the box with its updated rating and review count
 */
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(slug): ApiPath<String>,
    ApiJson(input): ApiJson<ReviewInput>,
) -> ApiResult<MysteryBox> {
    let user = state.services.users.get(auth.user_id).await?;
    let reviewed = state
        .services
        .catalog
        .add_review(&slug, user.id, &user.name, input)
        .await?;
    Ok(ApiResponse::created(reviewed))
}

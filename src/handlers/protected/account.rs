// handlers/protected/account.rs - the caller's own account

use axum::{extract::State, Extension};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::UserProfile;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::users::ProfileUpdate;

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult<UserProfile> {
    let user = state.services.users.get(auth.user_id).await?;
    Ok(ApiResponse::success(UserProfile::from(&user)))
}

/// PUT /api/auth/me - name and phone only
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> ApiResult<UserProfile> {
    let user = state.services.users.update_profile(auth.user_id, update).await?;
    Ok(ApiResponse::success(UserProfile::from(&user)))
}

/// POST /api/auth/logout - tokens are stateless; the client drops its copy
pub async fn logout(Extension(auth): Extension<AuthUser>) -> ApiResponse<Value> {
    tracing::debug!("User {} signed out", auth.user_id);
    ApiResponse::success(json!({ "message": "Logged out" }))
}

// handlers/protected/addresses.rs - the caller's address book

use axum::{extract::State, Extension};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::Address;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::addresses::AddressInput;

/// GET /api/user/addresses - creation order
pub async fn list(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult<Vec<Address>> {
    Ok(ApiResponse::success(state.services.addresses.list(auth.user_id).await?))
}

/**
 * POST /api/user/addresses
 *
 * Input: `{ "type"?, "name", "phone", "line1", "line2"?, "landmark"?, "city",
 * "state", "pincode", "is_default"? }`. The first address becomes the default.
 */
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(input): ApiJson<AddressInput>,
) -> ApiResult<Address> {
    Ok(ApiResponse::created(state.services.addresses.add(auth.user_id, input).await?))
}

/// PUT /api/user/addresses/:id - full replacement
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(address_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<AddressInput>,
) -> ApiResult<Address> {
    let address = state.services.addresses.update(auth.user_id, address_id, input).await?;
    Ok(ApiResponse::success(address))
}

/// DELETE /api/user/addresses/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(address_id): ApiPath<Uuid>,
) -> ApiResult<Value> {
    state.services.addresses.delete(auth.user_id, address_id).await?;
    Ok(ApiResponse::success(json!({ "id": address_id, "deleted": true })))
}

/// PUT /api/user/addresses/:id/default
pub async fn set_default(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(address_id): ApiPath<Uuid>,
) -> ApiResult<Address> {
    Ok(ApiResponse::success(state.services.addresses.set_default(auth.user_id, address_id).await?))
}

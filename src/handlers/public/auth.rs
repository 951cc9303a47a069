// handlers/public/auth.rs - token acquisition

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::{generate_jwt, Claims};
use crate::database::models::{User, UserProfile};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::users::RegisterInput;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_in: u64,
    pub user: UserProfile,
}

/**
 * POST /api/auth/register - create a customer account and sign in
 *
 * Input: `{ "name", "email", "password", "phone"? }`
 * Output: `{ "token", "expires_in", "user" }` with 201
 */
pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> ApiResult<TokenResponse> {
    let user = state.services.users.register(input).await?;
    Ok(ApiResponse::created(issue_token(&state, &user)?))
}

/// POST /api/auth/login - exchange credentials for a bearer token
pub async fn login(State(state): State<AppState>, ApiJson(request): ApiJson<LoginRequest>) -> ApiResult<TokenResponse> {
    let email = request.email.ok_or_else(|| ApiError::missing_field("email"))?;
    let password = request.password.ok_or_else(|| ApiError::missing_field("password"))?;

    let user = state.services.users.login(&email, &password).await?;
    tracing::info!("User {} signed in", user.id);
    Ok(ApiResponse::success(issue_token(&state, &user)?))
}

pub(crate) fn issue_token(state: &AppState, user: &User) -> Result<TokenResponse, ApiError> {
    let expiry_hours = state.config.security.jwt_expiry_hours;
    let claims = Claims::new(user.id, user.email.clone(), user.role, expiry_hours);
    let token = generate_jwt(&claims, &state.config.security.jwt_secret).map_err(|e| {
        tracing::error!("Token generation failed: {}", e);
        ApiError::internal_server_error("Could not issue token")
    })?;

    Ok(TokenResponse {
        token,
        expires_in: expiry_hours * 3600,
        user: UserProfile::from(user),
    })
}

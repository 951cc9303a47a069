// handlers/elevated/support.rs - support desk

use axum::{extract::State, Extension};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{AuthorRole, SupportTicket};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::services::support::{Author, MessageInput, TicketQuery, TicketUpdate};
use crate::types::Page;

/// GET /api/admin/support?status=&priority=&category=&assigned_to=&search=&page=&limit=
pub async fn list(State(state): State<AppState>, ApiQuery(query): ApiQuery<TicketQuery>) -> ApiResult<Page<SupportTicket>> {
    Ok(ApiResponse::success(state.services.support.admin_list(&query).await?))
}

/// GET /api/admin/support/:id - full ticket, internal notes included
pub async fn show(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<SupportTicket> {
    Ok(ApiResponse::success(state.services.support.get(id).await?))
}

/**
 * PUT /api/admin/support/:id - admin-only fields
 *
 * Input: any of `status`, `priority`, `assigned_to`, `tags`,
 * `estimated_resolution`, `is_escalated`, `escalation_reason`, `internal_note`.
 */
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<TicketUpdate>,
) -> ApiResult<SupportTicket> {
    Ok(ApiResponse::success(state.services.support.admin_update(auth.user_id, id, update).await?))
}

/// POST /api/admin/support/:id/reply - `{ "text", "attachments"? }`; status is left alone
pub async fn reply(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<MessageInput>,
) -> ApiResult<SupportTicket> {
    let admin = state.services.users.get(auth.user_id).await?;
    let author = Author { role: AuthorRole::Admin, id: admin.id, name: admin.name };
    Ok(ApiResponse::created(state.services.support.add_admin_reply(author, id, input).await?))
}

// handlers/protected/support.rs - the caller's support tickets

use axum::{extract::State, Extension};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{AuthorRole, CustomerTicket, TicketStatus};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::services::support::{Author, CreateTicketInput, MessageInput};

#[derive(Debug, Deserialize)]
pub struct TicketListQuery {
    pub status: Option<TicketStatus>,
}

/// GET /api/user/support?status= - newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<TicketListQuery>,
) -> ApiResult<Vec<CustomerTicket>> {
    Ok(ApiResponse::success(state.services.support.list_for_user(auth.user_id, query.status).await?))
}

/**
 * POST /api/user/support - open a ticket
 *
 * Input: `{ "subject", "description", "category", "priority"?, "order_id"? }`
 * A linked order must be one of the caller's.
 */
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(input): ApiJson<CreateTicketInput>,
) -> ApiResult<CustomerTicket> {
    let ticket = state.services.support.create_ticket(auth.user_id, input).await?;
    Ok(ApiResponse::created(ticket.into()))
}

/// GET /api/user/support/:id - without admin-only fields
pub async fn show(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(ticket_id): ApiPath<Uuid>,
) -> ApiResult<CustomerTicket> {
    Ok(ApiResponse::success(state.services.support.get_for_user(auth.user_id, ticket_id).await?))
}

/// POST /api/user/support/:id/messages - `{ "text", "attachments"? }`
pub async fn add_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(ticket_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<MessageInput>,
) -> ApiResult<CustomerTicket> {
    let user = state.services.users.get(auth.user_id).await?;
    let author = Author { role: AuthorRole::User, id: user.id, name: user.name };
    let ticket = state.services.support.add_user_message(author, ticket_id, input).await?;
    Ok(ApiResponse::created(ticket))
}

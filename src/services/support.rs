use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::config::FilterConfig;
use crate::database::models::{
    AuthorRole, CustomerTicket, InternalNote, Order, SupportTicket, TicketCategory, TicketMessage, TicketPriority,
    TicketStatus,
};
use crate::database::{DatabaseError, DocumentStore, Repository};
use crate::filter::FilterData;
use crate::types::{Page, Pagination};

#[derive(Debug, thiserror::Error)]
pub enum SupportError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Message text cannot be empty")]
    EmptyMessage,
    #[error("Ticket not found")]
    NotFound,
    #[error("Linked order not found")]
    OrderNotFound,
    #[error("Ticket belongs to another user")]
    Forbidden,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTicketInput {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub category: Option<TicketCategory>,
    pub priority: Option<TicketPriority>,
    pub order_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageInput {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// Who is writing a message.
#[derive(Debug, Clone)]
pub struct Author {
    pub role: AuthorRole,
    pub id: Uuid,
    pub name: String,
}

/// Admin-only ticket fields. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketUpdate {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    /// Empty string unassigns.
    pub assigned_to: Option<String>,
    pub tags: Option<Vec<String>>,
    pub estimated_resolution: Option<DateTime<Utc>>,
    pub is_escalated: Option<bool>,
    pub escalation_reason: Option<String>,
    pub internal_note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketQuery {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub category: Option<TicketCategory>,
    pub assigned_to: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Clone)]
pub struct SupportService {
    tickets: Repository<SupportTicket>,
    orders: Repository<Order>,
    filter: FilterConfig,
}

impl SupportService {
    pub fn new(store: Arc<dyn DocumentStore>, filter: FilterConfig) -> Self {
        Self {
            tickets: Repository::new(store.clone()),
            orders: Repository::new(store),
            filter,
        }
    }

    pub async fn create_ticket(&self, user_id: Uuid, input: CreateTicketInput) -> Result<SupportTicket, SupportError> {
        let subject = required(input.subject, "subject")?;
        let description = required(input.description, "description")?;
        let category = input.category.ok_or(SupportError::MissingField("category"))?;

        if let Some(order_id) = input.order_id {
            let owned = self.orders.get(order_id).await?.is_some_and(|o| o.user_id == user_id);
            if !owned {
                return Err(SupportError::OrderNotFound);
            }
        }

        let now = Utc::now();
        let ticket = SupportTicket {
            id: Uuid::now_v7(),
            user_id,
            ticket_number: ticket_number(now),
            subject,
            description,
            category,
            priority: input.priority.unwrap_or_default(),
            status: TicketStatus::Open,
            order_id: input.order_id,
            messages: vec![],
            assigned_to: None,
            internal_notes: vec![],
            tags: vec![],
            estimated_resolution: None,
            is_escalated: false,
            escalation_reason: None,
            resolved_at: None,
            created_at: now,
            updated_at: now,
        };
        self.tickets.save(&ticket).await?;
        info!("Ticket {} opened by {}", ticket.ticket_number, user_id);
        Ok(ticket)
    }

    /// The user's own tickets, newest first.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<TicketStatus>,
    ) -> Result<Vec<CustomerTicket>, SupportError> {
        let mut clause = json!({ "user_id": user_id });
        if let Some(status) = status {
            clause["status"] = json!(status);
        }
        let tickets = self
            .tickets
            .select_any(FilterData::new().with_where(clause).with_order("created_at desc"))
            .await?;
        Ok(tickets.into_iter().map(CustomerTicket::from).collect())
    }

    pub async fn get_for_user(&self, user_id: Uuid, ticket_id: Uuid) -> Result<CustomerTicket, SupportError> {
        Ok(self.owned(user_id, ticket_id).await?.into())
    }

    /// Owner reply. The status is left unchanged.
    pub async fn add_user_message(&self, author: Author, ticket_id: Uuid, input: MessageInput) -> Result<CustomerTicket, SupportError> {
        let ticket = self.owned(author.id, ticket_id).await?;
        Ok(self.append(ticket, author, input).await?.into())
    }

    pub async fn add_admin_reply(&self, author: Author, ticket_id: Uuid, input: MessageInput) -> Result<SupportTicket, SupportError> {
        let ticket = self.get(ticket_id).await?;
        self.append(ticket, author, input).await
    }

    pub async fn get(&self, ticket_id: Uuid) -> Result<SupportTicket, SupportError> {
        self.tickets.get(ticket_id).await?.ok_or(SupportError::NotFound)
    }

    pub async fn admin_list(&self, query: &TicketQuery) -> Result<Page<SupportTicket>, SupportError> {
        let mut clause = Map::new();
        if let Some(status) = query.status {
            clause.insert("status".into(), json!(status));
        }
        if let Some(priority) = query.priority {
            clause.insert("priority".into(), json!(priority));
        }
        if let Some(category) = query.category {
            clause.insert("category".into(), json!(category));
        }
        if let Some(assignee) = query.assigned_to.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            clause.insert("assigned_to".into(), json!(assignee));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.replace(['%', '_'], ""));
            clause.insert(
                "$or".into(),
                json!([
                    { "ticket_number": { "$ilike": pattern } },
                    { "subject": { "$ilike": pattern } },
                    { "description": { "$ilike": pattern } },
                ]),
            );
        }
        let where_clause = Value::Object(clause);

        let (page, limit, offset) = Pagination { page: query.page, limit: query.limit }
            .resolve(self.filter.default_limit, self.filter.max_limit);
        let total = self.tickets.count(FilterData::new().with_where(where_clause.clone())).await?;
        let items = self
            .tickets
            .select_any(
                FilterData::new()
                    .with_where(where_clause)
                    .with_order("created_at desc")
                    .with_limit(limit, Some(offset)),
            )
            .await?;
        Ok(Page::new(items, total, page, limit))
    }

    pub async fn admin_update(&self, admin_id: Uuid, ticket_id: Uuid, update: TicketUpdate) -> Result<SupportTicket, SupportError> {
        let mut ticket = self.get(ticket_id).await?;
        let now = Utc::now();

        if let Some(status) = update.status {
            if status != ticket.status {
                info!("Ticket {} {} -> {}", ticket.ticket_number, ticket.status.as_str(), status.as_str());
            }
            ticket.status = status;
            match status {
                TicketStatus::Resolved | TicketStatus::Closed => {
                    ticket.resolved_at.get_or_insert(now);
                }
                _ => ticket.resolved_at = None,
            }
        }
        if let Some(priority) = update.priority {
            ticket.priority = priority;
        }
        if let Some(assignee) = update.assigned_to {
            let assignee = assignee.trim();
            ticket.assigned_to = (!assignee.is_empty()).then(|| assignee.to_string());
        }
        if let Some(tags) = update.tags {
            ticket.tags = tags.into_iter().map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect();
        }
        if let Some(estimated) = update.estimated_resolution {
            ticket.estimated_resolution = Some(estimated);
        }
        if let Some(escalated) = update.is_escalated {
            ticket.is_escalated = escalated;
        }
        if !ticket.is_escalated {
            ticket.escalation_reason = None;
        } else if let Some(reason) = update.escalation_reason {
            let reason = reason.trim();
            ticket.escalation_reason = (!reason.is_empty()).then(|| reason.to_string());
        }
        if let Some(note) = update.internal_note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
            ticket.internal_notes.push(InternalNote { author_id: admin_id, note, timestamp: now });
        }

        ticket.updated_at = now;
        self.tickets.save(&ticket).await?;
        Ok(ticket)
    }

    pub async fn count_open(&self) -> Result<u64, SupportError> {
        let open: Vec<&str> = TicketStatus::ALL.iter().filter(|s| s.is_open()).map(|s| s.as_str()).collect();
        Ok(self
            .tickets
            .count(FilterData::new().with_where(json!({ "status": { "$in": open } })))
            .await?)
    }

    async fn owned(&self, user_id: Uuid, ticket_id: Uuid) -> Result<SupportTicket, SupportError> {
        let ticket = self.get(ticket_id).await?;
        if ticket.user_id != user_id {
            return Err(SupportError::Forbidden);
        }
        Ok(ticket)
    }

    async fn append(&self, mut ticket: SupportTicket, author: Author, input: MessageInput) -> Result<SupportTicket, SupportError> {
        let text = input.text.trim();
        if text.is_empty() {
            return Err(SupportError::EmptyMessage);
        }

        let now = Utc::now();
        ticket.messages.push(TicketMessage {
            id: Uuid::now_v7(),
            author_role: author.role,
            author_id: author.id,
            author_name: author.name,
            text: text.to_string(),
            attachments: input.attachments,
            timestamp: now,
        });
        ticket.updated_at = now;
        self.tickets.save(&ticket).await?;
        Ok(ticket)
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, SupportError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(SupportError::MissingField(field))
}

/// `TKT-YYYYMMDD-XXXXXXXX`
fn ticket_number(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("TKT-{}-{}", now.format("%Y%m%d"), &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;

    fn ticket_input() -> CreateTicketInput {
        CreateTicketInput {
            subject: Some("Box arrived damaged".into()),
            description: Some("The lid was crushed".into()),
            category: Some(TicketCategory::Shipping),
            priority: None,
            order_id: None,
        }
    }

    fn user(id: Uuid) -> Author {
        Author { role: AuthorRole::User, id, name: "Asha".into() }
    }

    fn admin() -> Author {
        Author { role: AuthorRole::Admin, id: Uuid::now_v7(), name: "Support".into() }
    }

    fn text(t: &str) -> MessageInput {
        MessageInput { text: t.into(), attachments: vec![] }
    }

    #[tokio::test]
    async fn create_requires_fields_and_starts_open() {
        let ctx = TestContext::new();
        let support = &ctx.services.support;
        let user_id = Uuid::now_v7();

        let ticket = support.create_ticket(user_id, ticket_input()).await.unwrap();
        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(ticket.priority, TicketPriority::Medium);
        assert!(ticket.ticket_number.starts_with("TKT-"));

        let other = support.create_ticket(user_id, ticket_input()).await.unwrap();
        assert_ne!(ticket.ticket_number, other.ticket_number);

        let mut missing = ticket_input();
        missing.subject = Some("   ".into());
        assert!(matches!(support.create_ticket(user_id, missing).await, Err(SupportError::MissingField("subject"))));
        let mut missing = ticket_input();
        missing.category = None;
        assert!(matches!(support.create_ticket(user_id, missing).await, Err(SupportError::MissingField("category"))));
    }

    #[tokio::test]
    async fn linked_order_must_belong_to_creator() {
        let ctx = TestContext::new();
        let mut input = ticket_input();
        input.order_id = Some(Uuid::now_v7());
        let err = ctx.services.support.create_ticket(Uuid::now_v7(), input).await.unwrap_err();
        assert!(matches!(err, SupportError::OrderNotFound));
    }

    #[tokio::test]
    async fn messages_keep_insertion_order_and_status() {
        let ctx = TestContext::new();
        let support = &ctx.services.support;
        let user_id = Uuid::now_v7();
        let ticket = support.create_ticket(user_id, ticket_input()).await.unwrap();

        support.add_user_message(user(user_id), ticket.id, text("first")).await.unwrap();
        support.add_admin_reply(admin(), ticket.id, text("second")).await.unwrap();
        let view = support.add_user_message(user(user_id), ticket.id, text("third")).await.unwrap();

        let texts: Vec<&str> = view.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(view.messages[1].author_role, AuthorRole::Admin);
        assert_eq!(view.status, TicketStatus::Open);
    }

    #[tokio::test]
    async fn blank_messages_are_rejected() {
        let ctx = TestContext::new();
        let support = &ctx.services.support;
        let user_id = Uuid::now_v7();
        let ticket = support.create_ticket(user_id, ticket_input()).await.unwrap();
        assert!(matches!(
            support.add_user_message(user(user_id), ticket.id, text(" \n\t ")).await,
            Err(SupportError::EmptyMessage)
        ));
        assert!(support.get(ticket.id).await.unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn users_only_see_their_own_tickets() {
        let ctx = TestContext::new();
        let support = &ctx.services.support;
        let (owner, stranger) = (Uuid::now_v7(), Uuid::now_v7());
        let ticket = support.create_ticket(owner, ticket_input()).await.unwrap();

        assert!(matches!(support.get_for_user(stranger, ticket.id).await, Err(SupportError::Forbidden)));
        assert!(matches!(
            support.add_user_message(user(stranger), ticket.id, text("hi")).await,
            Err(SupportError::Forbidden)
        ));
        assert_eq!(support.list_for_user(owner, None).await.unwrap().len(), 1);
        assert!(support.list_for_user(stranger, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn admin_update_sets_fields_and_resolution_time() {
        let ctx = TestContext::new();
        let support = &ctx.services.support;
        let ticket = support.create_ticket(Uuid::now_v7(), ticket_input()).await.unwrap();
        let admin_id = Uuid::now_v7();

        let updated = support
            .admin_update(
                admin_id,
                ticket.id,
                TicketUpdate {
                    status: Some(TicketStatus::InProgress),
                    priority: Some(TicketPriority::Urgent),
                    assigned_to: Some("priya".into()),
                    tags: Some(vec!["damage".into(), " ".into()]),
                    is_escalated: Some(true),
                    escalation_reason: Some("Repeat customer".into()),
                    internal_note: Some("Asked courier for photos".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.priority, TicketPriority::Urgent);
        assert_eq!(updated.assigned_to.as_deref(), Some("priya"));
        assert_eq!(updated.tags, vec!["damage"]);
        assert!(updated.is_escalated);
        assert_eq!(updated.internal_notes[0].author_id, admin_id);
        assert!(updated.resolved_at.is_none());

        let resolved = support
            .admin_update(admin_id, ticket.id, TicketUpdate { status: Some(TicketStatus::Resolved), ..Default::default() })
            .await
            .unwrap();
        assert!(resolved.resolved_at.is_some());
        assert_eq!(support.count_open().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn escalation_reason_only_sticks_to_escalated_tickets() {
        let ctx = TestContext::new();
        let support = &ctx.services.support;
        let ticket = support.create_ticket(Uuid::now_v7(), ticket_input()).await.unwrap();
        let admin_id = Uuid::now_v7();

        let calm = support
            .admin_update(
                admin_id,
                ticket.id,
                TicketUpdate { is_escalated: Some(false), escalation_reason: Some("x".into()), ..Default::default() },
            )
            .await
            .unwrap();
        assert!(!calm.is_escalated);
        assert!(calm.escalation_reason.is_none());

        let reason_only = support
            .admin_update(admin_id, ticket.id, TicketUpdate { escalation_reason: Some("VIP".into()), ..Default::default() })
            .await
            .unwrap();
        assert!(reason_only.escalation_reason.is_none());

        let escalated = support
            .admin_update(
                admin_id,
                ticket.id,
                TicketUpdate { is_escalated: Some(true), escalation_reason: Some("VIP".into()), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(escalated.escalation_reason.as_deref(), Some("VIP"));

        let cleared = support
            .admin_update(admin_id, ticket.id, TicketUpdate { is_escalated: Some(false), ..Default::default() })
            .await
            .unwrap();
        assert!(cleared.escalation_reason.is_none());
    }

    #[tokio::test]
    async fn customer_view_hides_admin_fields() {
        let ctx = TestContext::new();
        let support = &ctx.services.support;
        let owner = Uuid::now_v7();
        let ticket = support.create_ticket(owner, ticket_input()).await.unwrap();
        support
            .admin_update(Uuid::now_v7(), ticket.id, TicketUpdate { internal_note: Some("vip".into()), ..Default::default() })
            .await
            .unwrap();

        let view = serde_json::to_value(support.get_for_user(owner, ticket.id).await.unwrap()).unwrap();
        assert!(view.get("internal_notes").is_none());
        assert!(view.get("assigned_to").is_none());
    }

    #[tokio::test]
    async fn admin_list_filters() {
        let ctx = TestContext::new();
        let support = &ctx.services.support;
        let user_id = Uuid::now_v7();
        support.create_ticket(user_id, ticket_input()).await.unwrap();
        let mut payment = ticket_input();
        payment.subject = Some("Refund pending".into());
        payment.category = Some(TicketCategory::Refund);
        payment.priority = Some(TicketPriority::High);
        support.create_ticket(user_id, payment).await.unwrap();

        let refunds = support
            .admin_list(&TicketQuery { category: Some(TicketCategory::Refund), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(refunds.total, 1);
        let searched = support
            .admin_list(&TicketQuery { search: Some("damaged".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(searched.items[0].category, TicketCategory::Shipping);
        let high = support
            .admin_list(&TicketQuery { priority: Some(TicketPriority::High), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(high.items[0].subject, "Refund pending");
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::config::FilterConfig;
use crate::database::models::{
    Address, AddressSnapshot, CartCoupon, CartItem, MysteryBox, Order, OrderItem, OrderStatus, PaymentMethod,
    TimelineEntry,
};
use crate::database::{DatabaseError, DocumentStore, Repository, WriteBatch};
use crate::filter::FilterData;
use crate::services::cart::{CartError, CartService};
use crate::services::pricing::PricingEngine;
use crate::types::{DeliveryOption, Page, Pagination, StatusStyle};

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Cart is empty")]
    EmptyCart,
    #[error("{0} is out of stock")]
    OutOfStock(String),
    #[error("Address not found")]
    AddressNotFound,
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Order belongs to another user")]
    Forbidden,
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error(transparent)]
    Cart(#[from] CartError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address_id: Uuid,
    pub billing_address_id: Option<Uuid>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub delivery: DeliveryOption,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackingUpdate {
    pub status: OrderStatus,
    pub location: Option<String>,
    pub description: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    /// Admin only: order number fragment.
    pub search: Option<String>,
    pub user_id: Option<Uuid>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Public tracking view: no address or payment details.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingInfo {
    pub order_id: Uuid,
    pub order_number: String,
    pub tracking_number: String,
    pub status: OrderStatus,
    pub status_style: StatusStyle,
    pub estimated_delivery: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub latest: Option<TimelineEntry>,
    pub timeline: Vec<TimelineEntry>,
    pub item_count: usize,
    pub destination_city: String,
}

impl From<&Order> for TrackingInfo {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id,
            order_number: order.order_number.clone(),
            tracking_number: order.tracking_number.clone(),
            status: order.status,
            status_style: order.status.style(),
            estimated_delivery: order.estimated_delivery,
            delivered_at: order.delivered_at,
            latest: order.latest_entry().cloned(),
            timeline: order.timeline.clone(),
            item_count: order.items.len(),
            destination_city: order.shipping_address.city.clone(),
        }
    }
}

#[derive(Clone)]
pub struct OrderService {
    orders: Repository<Order>,
    addresses: Repository<Address>,
    boxes: Repository<MysteryBox>,
    store: Arc<dyn DocumentStore>,
    cart: CartService,
    pricing: PricingEngine,
    filter: FilterConfig,
}

impl OrderService {
    pub fn new(store: Arc<dyn DocumentStore>, cart: CartService, pricing: PricingEngine, filter: FilterConfig) -> Self {
        Self {
            orders: Repository::new(store.clone()),
            addresses: Repository::new(store.clone()),
            boxes: Repository::new(store.clone()),
            store,
            cart,
            pricing,
            filter,
        }
    }

    /// Place an order from the user's cart. Writes the order, decrements stock
    /// and clears the cart in one batch; any failure before that writes nothing.
    pub async fn create_order(&self, user_id: Uuid, request: CheckoutRequest) -> Result<Order, OrderError> {
        let snapshot = self.cart.snapshot(user_id).await?;
        if snapshot.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let mut items = Vec::with_capacity(snapshot.items.len());
        let mut restocked = Vec::with_capacity(snapshot.items.len());
        for (cart_item, current) in &snapshot.items {
            let current = current
                .as_ref()
                .ok_or_else(|| OrderError::OutOfStock(format!("Box {}", cart_item.box_id)))?;
            if !current.in_stock(cart_item.quantity) {
                return Err(OrderError::OutOfStock(current.name.clone()));
            }

            items.push(order_item(current, cart_item.quantity));
            let mut updated = current.clone();
            updated.stock -= cart_item.quantity;
            updated.updated_at = Utc::now();
            restocked.push(updated);
        }

        let shipping = self.owned_address(user_id, request.shipping_address_id).await?;
        let billing = match request.billing_address_id {
            Some(id) if id != shipping.id => self.owned_address(user_id, id).await?,
            _ => shipping.clone(),
        };

        let (summary, coupon_code) = self
            .cart
            .price(&snapshot.lines(), snapshot.coupon.as_ref(), request.delivery);

        let now = Utc::now();
        let order = Order {
            id: Uuid::now_v7(),
            user_id,
            order_number: order_number(now),
            tracking_number: tracking_number(),
            items,
            summary,
            coupon_code,
            delivery: request.delivery,
            shipping_address: AddressSnapshot::from(&shipping),
            billing_address: AddressSnapshot::from(&billing),
            payment_method: request.payment_method,
            status: OrderStatus::Pending,
            timeline: vec![TimelineEntry {
                status: OrderStatus::Pending,
                location: None,
                description: Some(default_description(OrderStatus::Pending).to_string()),
                timestamp: now,
            }],
            estimated_delivery: self.pricing.estimated_delivery(now, request.delivery),
            delivered_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        };

        let mut batch = WriteBatch::new();
        batch.put(&order)?;
        for b in &restocked {
            batch.put(b)?;
        }
        for (cart_item, _) in &snapshot.items {
            batch.delete::<CartItem>(cart_item.id);
        }
        if snapshot.coupon.is_some() {
            batch.delete::<CartCoupon>(user_id);
        }
        self.store.commit(batch).await?;

        info!(
            "Order {} placed by {} ({} items, total {})",
            order.order_number,
            user_id,
            order.items.len(),
            order.summary.total
        );
        Ok(order)
    }

    /// Validate against the state machine, append to the timeline and mirror
    /// the status. Cancelling puts the stock back in the same write.
    pub async fn append_tracking_update(&self, key: &str, update: TrackingUpdate) -> Result<Order, OrderError> {
        let order = self.lookup(key).await?;
        self.transition(order, update).await
    }

    /// By id, tracking number or order number.
    pub async fn lookup(&self, key: &str) -> Result<Order, OrderError> {
        let key = key.trim();
        if let Ok(id) = Uuid::parse_str(key) {
            if let Some(order) = self.orders.get(id).await? {
                return Ok(order);
            }
        }

        let by_number = self
            .orders
            .select_one(FilterData::new().with_where(json!({
                "$or": [
                    { "tracking_number": key.to_uppercase() },
                    { "order_number": key.to_uppercase() },
                ]
            })))
            .await?;
        by_number.ok_or_else(|| OrderError::NotFound(key.to_string()))
    }

    pub async fn tracking(&self, key: &str) -> Result<TrackingInfo, OrderError> {
        Ok(TrackingInfo::from(&self.lookup(key).await?))
    }

    pub async fn list_for_user(&self, user_id: Uuid, query: &OrderQuery) -> Result<Page<Order>, OrderError> {
        let query = OrderQuery { user_id: Some(user_id), search: None, ..query.clone() };
        self.list(&query).await
    }

    pub async fn get_for_user(&self, user_id: Uuid, order_id: Uuid) -> Result<Order, OrderError> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;
        if order.user_id != user_id {
            return Err(OrderError::Forbidden);
        }
        Ok(order)
    }

    /// Customer cancellation: pending or processing only.
    pub async fn cancel(&self, user_id: Uuid, order_id: Uuid, reason: Option<String>) -> Result<Order, OrderError> {
        let order = self.get_for_user(user_id, order_id).await?;
        let description = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .map(|r| format!("Cancelled by customer: {}", r));
        self.transition(
            order,
            TrackingUpdate { status: OrderStatus::Cancelled, location: None, description, timestamp: None },
        )
        .await
    }

    /// Newest first. Filters by status, owner and order number fragment.
    pub async fn list(&self, query: &OrderQuery) -> Result<Page<Order>, OrderError> {
        let mut clause = Map::new();
        if let Some(status) = query.status {
            clause.insert("status".into(), json!(status));
        }
        if let Some(user_id) = query.user_id {
            clause.insert("user_id".into(), json!(user_id));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.replace(['%', '_'], ""));
            clause.insert(
                "$or".into(),
                json!([
                    { "order_number": { "$ilike": pattern } },
                    { "tracking_number": { "$ilike": pattern } },
                ]),
            );
        }
        let where_clause = Value::Object(clause);

        let (page, limit, offset) = Pagination { page: query.page, limit: query.limit }
            .resolve(self.filter.default_limit, self.filter.max_limit);
        let total = self.orders.count(FilterData::new().with_where(where_clause.clone())).await?;
        let items = self
            .orders
            .select_any(
                FilterData::new()
                    .with_where(where_clause)
                    .with_order("created_at desc")
                    .with_limit(limit, Some(offset)),
            )
            .await?;
        Ok(Page::new(items, total, page, limit))
    }

    async fn transition(&self, mut order: Order, update: TrackingUpdate) -> Result<Order, OrderError> {
        let from = order.status;
        let to = update.status;
        if !from.can_transition_to(to) {
            return Err(OrderError::InvalidTransition { from, to });
        }

        let now = Utc::now();
        let timestamp = update.timestamp.unwrap_or(now);
        order.timeline.push(TimelineEntry {
            status: to,
            location: update.location.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()),
            description: Some(
                update
                    .description
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| default_description(to).to_string()),
            ),
            timestamp,
        });
        order.status = to;
        order.updated_at = now;

        let mut batch = WriteBatch::new();
        match to {
            OrderStatus::Delivered => order.delivered_at = Some(timestamp),
            OrderStatus::Cancelled => {
                order.cancelled_at = Some(timestamp);
                for b in self.restock(&order).await? {
                    batch.put(&b)?;
                }
            }
            _ => {}
        }
        batch.put(&order)?;
        self.store.commit(batch).await?;

        info!("Order {} moved {} -> {}", order.order_number, from, to);
        Ok(order)
    }

    /// Boxes with the order's quantities added back.
    async fn restock(&self, order: &Order) -> Result<Vec<MysteryBox>, OrderError> {
        let mut quantities: HashMap<Uuid, u32> = HashMap::new();
        for item in &order.items {
            *quantities.entry(item.box_id).or_default() += item.quantity;
        }
        let ids: Vec<Uuid> = quantities.keys().copied().collect();
        let now = Utc::now();
        Ok(self
            .boxes
            .select_ids(&ids)
            .await?
            .into_iter()
            .map(|mut b| {
                b.stock = b.stock.saturating_add(quantities.get(&b.id).copied().unwrap_or(0));
                b.updated_at = now;
                b
            })
            .collect())
    }

    async fn owned_address(&self, user_id: Uuid, address_id: Uuid) -> Result<Address, OrderError> {
        self.addresses
            .get(address_id)
            .await?
            .filter(|a| a.user_id == user_id)
            .ok_or(OrderError::AddressNotFound)
    }
}

fn order_item(b: &MysteryBox, quantity: u32) -> OrderItem {
    OrderItem {
        box_id: b.id,
        name: b.name.clone(),
        slug: b.slug.clone(),
        image: b.images.first().cloned(),
        unit_price: b.price,
        quantity,
        line_total: b.price * Decimal::from(quantity),
    }
}

fn default_description(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "Order placed",
        OrderStatus::Processing => "Order is being processed",
        OrderStatus::Packed => "Order packed and ready to ship",
        OrderStatus::Shipped => "Order shipped",
        OrderStatus::Delivered => "Order delivered",
        OrderStatus::Cancelled => "Order cancelled",
    }
}

/// `ST-YYYYMMDD-XXXXXXXX`
fn order_number(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("ST-{}-{}", now.format("%Y%m%d"), &suffix[..8])
}

/// `TRK` followed by 12 hex digits.
fn tracking_number() -> String {
    let suffix = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("TRK{}", &suffix[..12])
}

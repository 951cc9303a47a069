use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::config::InventoryConfig;
use crate::database::models::{
    Influencer, InfluencerStatus, MysteryBox, Order, OrderStatus, SupportTicket, TicketStatus, User,
};
use crate::database::{DatabaseError, DocumentStore, Repository};
use crate::filter::FilterData;
use crate::services::pricing::round_money;
use crate::types::Role;

const TOP_BOXES: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct TopBox {
    pub box_id: Uuid,
    pub name: String,
    pub units_sold: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct LowStockBox {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub stock: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_orders: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_order_value: Decimal,
    pub orders_by_status: BTreeMap<&'static str, u64>,
    pub total_customers: u64,
    pub active_boxes: u64,
    pub low_stock_threshold: u32,
    pub low_stock_boxes: Vec<LowStockBox>,
    pub open_tickets: u64,
    pub influencers_by_status: BTreeMap<&'static str, u64>,
    pub top_boxes: Vec<TopBox>,
}

/// Read-only aggregates for the admin dashboard.
#[derive(Clone)]
pub struct AnalyticsService {
    orders: Repository<Order>,
    boxes: Repository<MysteryBox>,
    users: Repository<User>,
    tickets: Repository<SupportTicket>,
    influencers: Repository<Influencer>,
    inventory: InventoryConfig,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn DocumentStore>, inventory: InventoryConfig) -> Self {
        Self {
            orders: Repository::new(store.clone()),
            boxes: Repository::new(store.clone()),
            users: Repository::new(store.clone()),
            tickets: Repository::new(store.clone()),
            influencers: Repository::new(store),
            inventory,
        }
    }

    pub async fn dashboard(&self) -> Result<DashboardStats, DatabaseError> {
        let orders = self.orders.select_any(FilterData::new()).await?;
        let boxes = self.boxes.select_any(FilterData::new().with_order("stock asc")).await?;

        let mut orders_by_status: BTreeMap<&'static str, u64> =
            OrderStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        let mut revenue = Decimal::ZERO;
        let mut billable = 0u64;
        let mut sold: HashMap<Uuid, TopBox> = HashMap::new();

        for order in &orders {
            *orders_by_status.entry(order.status.as_str()).or_default() += 1;
            if order.status == OrderStatus::Cancelled {
                continue;
            }
            revenue += order.summary.total;
            billable += 1;
            for item in &order.items {
                let entry = sold.entry(item.box_id).or_insert_with(|| TopBox {
                    box_id: item.box_id,
                    name: item.name.clone(),
                    units_sold: 0,
                    revenue: Decimal::ZERO,
                });
                entry.units_sold += item.quantity as u64;
                entry.revenue += item.line_total;
            }
        }

        let average_order_value = if billable == 0 {
            Decimal::ZERO
        } else {
            round_money(revenue / Decimal::from(billable))
        };

        let mut top_boxes: Vec<TopBox> = sold.into_values().collect();
        top_boxes.sort_by(|a, b| b.units_sold.cmp(&a.units_sold).then_with(|| a.name.cmp(&b.name)));
        top_boxes.truncate(TOP_BOXES);

        let threshold = self.inventory.low_stock_threshold;
        let active_boxes = boxes.iter().filter(|b| b.is_active).count() as u64;
        let low_stock_boxes = boxes
            .iter()
            .filter(|b| b.is_active && b.stock <= threshold)
            .map(|b| LowStockBox { id: b.id, name: b.name.clone(), slug: b.slug.clone(), stock: b.stock })
            .collect();

        let total_customers = self
            .users
            .count(FilterData::new().with_where(json!({ "role": Role::Customer })))
            .await?;

        let open: Vec<&str> = TicketStatus::ALL.iter().filter(|s| s.is_open()).map(|s| s.as_str()).collect();
        let open_tickets = self
            .tickets
            .count(FilterData::new().with_where(json!({ "status": { "$in": open } })))
            .await?;

        let mut influencers_by_status = BTreeMap::new();
        for status in InfluencerStatus::ALL {
            let n = self
                .influencers
                .count(FilterData::new().with_where(json!({ "status": status })))
                .await?;
            influencers_by_status.insert(status.as_str(), n);
        }

        Ok(DashboardStats {
            total_orders: orders.len() as u64,
            total_revenue: round_money(revenue),
            average_order_value,
            orders_by_status,
            total_customers,
            active_boxes,
            low_stock_threshold: threshold,
            low_stock_boxes,
            open_tickets,
            influencers_by_status,
            top_boxes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::PaymentMethod;
    use crate::services::orders::{CheckoutRequest, TrackingUpdate};
    use crate::testing::TestContext;
    use crate::types::DeliveryOption;

    fn checkout(address_id: Uuid) -> CheckoutRequest {
        CheckoutRequest {
            shipping_address_id: address_id,
            billing_address_id: None,
            payment_method: PaymentMethod::Cod,
            delivery: DeliveryOption::Standard,
        }
    }

    #[tokio::test]
    async fn empty_store_reports_zeroes() {
        let ctx = TestContext::new();
        let stats = ctx.services.analytics.dashboard().await.unwrap();
        assert_eq!(stats.total_orders, 0);
        assert_eq!(stats.total_revenue, Decimal::ZERO);
        assert_eq!(stats.average_order_value, Decimal::ZERO);
        assert_eq!(stats.orders_by_status["pending"], 0);
        assert_eq!(stats.influencers_by_status.len(), InfluencerStatus::ALL.len());
        assert!(stats.top_boxes.is_empty());
    }

    #[tokio::test]
    async fn revenue_excludes_cancelled_orders() {
        let ctx = TestContext::new();
        let user = ctx.create_customer("stats@example.com").await;
        let address = ctx.create_address(user.id).await;
        let big = ctx.create_box("Birthday Bash", "599", 20).await;
        let small = ctx.create_box("Mini Birthday", "299", 4).await;

        ctx.services.cart.add_item(user.id, big.id, 2).await.unwrap();
        let kept = ctx.services.orders.create_order(user.id, checkout(address.id)).await.unwrap();

        ctx.services.cart.add_item(user.id, small.id, 1).await.unwrap();
        let cancelled = ctx.services.orders.create_order(user.id, checkout(address.id)).await.unwrap();
        ctx.services
            .orders
            .append_tracking_update(
                &cancelled.id.to_string(),
                TrackingUpdate { status: OrderStatus::Cancelled, location: None, description: None, timestamp: None },
            )
            .await
            .unwrap();

        let stats = ctx.services.analytics.dashboard().await.unwrap();
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.total_revenue, kept.summary.total);
        assert_eq!(stats.average_order_value, kept.summary.total);
        assert_eq!(stats.orders_by_status["cancelled"], 1);
        assert_eq!(stats.orders_by_status["pending"], 1);
        assert_eq!(stats.total_customers, 1);
        assert_eq!(stats.active_boxes, 2);
        assert_eq!(stats.top_boxes.len(), 1);
        assert_eq!(stats.top_boxes[0].units_sold, 2);
        let low: Vec<&str> = stats.low_stock_boxes.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(low, vec!["Mini Birthday"]);
    }
}

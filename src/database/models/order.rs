use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::address::AddressSnapshot;
use crate::database::store::{Collection, Document};
use crate::types::{DeliveryOption, PriceSummary};

/// Order lifecycle: pending → processing → packed → shipped → delivered,
/// with `cancelled` reachable from pending or processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Packed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Packed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Packed => "packed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    fn rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Processing => Some(1),
            OrderStatus::Packed => Some(2),
            OrderStatus::Shipped => Some(3),
            OrderStatus::Delivered => Some(4),
            OrderStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }

    /// Forward moves (including jumps and repeats of a non-terminal status)
    /// are allowed; backward moves and anything out of a terminal state are not.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if target == OrderStatus::Cancelled {
            return self.is_cancellable();
        }
        match (self.rank(), target.rank()) {
            (Some(from), Some(to)) => to >= from,
            _ => false,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cod,
    Upi,
    Card,
    NetBanking,
    Wallet,
}

/// Line item frozen at checkout; later catalog price changes do not apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub box_id: Uuid,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub line_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub status: OrderStatus,
    pub location: Option<String>,
    pub description: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_number: String,
    pub tracking_number: String,
    pub items: Vec<OrderItem>,
    pub summary: PriceSummary,
    pub coupon_code: Option<String>,
    pub delivery: DeliveryOption,
    pub shipping_address: AddressSnapshot,
    pub billing_address: AddressSnapshot,
    pub payment_method: PaymentMethod,
    /// Mirror of the latest timeline entry's status.
    pub status: OrderStatus,
    pub timeline: Vec<TimelineEntry>,
    pub estimated_delivery: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn latest_entry(&self) -> Option<&TimelineEntry> {
        self.timeline.last()
    }
}

impl Document for Order {
    const COLLECTION: Collection = Collection::Orders;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;

    #[test]
    fn forward_moves_are_allowed() {
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Packed));
        assert!(Packed.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Pending.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Shipped));
    }

    #[test]
    fn backward_moves_are_rejected() {
        assert!(!Shipped.can_transition_to(Pending));
        assert!(!Packed.can_transition_to(Processing));
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for target in super::OrderStatus::ALL {
            assert!(!Delivered.can_transition_to(target), "delivered -> {target}");
            assert!(!Cancelled.can_transition_to(target), "cancelled -> {target}");
        }
    }

    #[test]
    fn cancellation_only_before_packing() {
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Cancelled));
        assert!(!Packed.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Cancelled));
    }
}

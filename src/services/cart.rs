use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::database::models::{CartCoupon, CartItem, MysteryBox};
use crate::database::{DatabaseError, DocumentStore, Repository, WriteBatch};
use crate::filter::FilterData;
use crate::services::pricing::{PriceLine, PricingEngine, PricingError};
use crate::types::{DeliveryOption, PriceSummary};

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Box not found")]
    BoxNotFound,
    #[error("Cart item not found")]
    ItemNotFound,
    #[error("Only {available} left in stock for {name}")]
    OutOfStock { name: String, available: u32 },
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// One cart line joined with the current box data.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub item_id: Uuid,
    pub box_id: Uuid,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub line_total: Decimal,
    pub available_stock: u32,
    pub in_stock: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub coupon_code: Option<String>,
    pub delivery: DeliveryOption,
    pub summary: PriceSummary,
}

/// Raw cart contents as read at one point in time.
#[derive(Debug, Clone)]
pub struct CartSnapshot {
    pub items: Vec<(CartItem, Option<MysteryBox>)>,
    pub coupon: Option<CartCoupon>,
}

impl CartSnapshot {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Lines whose box still exists, with current prices.
    pub fn lines(&self) -> Vec<CartLine> {
        self.items
            .iter()
            .filter_map(|(item, b)| b.as_ref().map(|b| cart_line(item, b)))
            .collect()
    }
}

fn cart_line(item: &CartItem, b: &MysteryBox) -> CartLine {
    CartLine {
        item_id: item.id,
        box_id: b.id,
        name: b.name.clone(),
        slug: b.slug.clone(),
        image: b.images.first().cloned(),
        unit_price: b.price,
        quantity: item.quantity,
        line_total: b.price * Decimal::from(item.quantity),
        available_stock: b.stock,
        in_stock: b.in_stock(item.quantity),
    }
}

#[derive(Clone)]
pub struct CartService {
    items: Repository<CartItem>,
    coupons: Repository<CartCoupon>,
    boxes: Repository<MysteryBox>,
    store: Arc<dyn DocumentStore>,
    pricing: PricingEngine,
}

impl CartService {
    pub fn new(store: Arc<dyn DocumentStore>, pricing: PricingEngine) -> Self {
        Self {
            items: Repository::new(store.clone()),
            coupons: Repository::new(store.clone()),
            boxes: Repository::new(store.clone()),
            store,
            pricing,
        }
    }

    /// Add to an existing (user, box) line or insert one. Quantity is clamped to at least 1.
    pub async fn add_item(&self, user_id: Uuid, box_id: Uuid, quantity: i64) -> Result<CartView, CartError> {
        let requested = quantity.clamp(1, u32::MAX as i64) as u32;
        let target = self
            .boxes
            .get(box_id)
            .await?
            .filter(|b| b.is_active)
            .ok_or(CartError::BoxNotFound)?;

        let existing = self
            .items
            .select_one(FilterData::new().with_where(json!({ "user_id": user_id, "box_id": box_id })))
            .await?;

        let now = Utc::now();
        let item = match existing {
            Some(mut item) => {
                item.quantity = item.quantity.saturating_add(requested);
                item.updated_at = now;
                item
            }
            None => CartItem {
                id: Uuid::now_v7(),
                user_id,
                box_id,
                quantity: requested,
                added_at: now,
                updated_at: now,
            },
        };

        if item.quantity > target.stock {
            return Err(CartError::OutOfStock { name: target.name, available: target.stock });
        }

        self.items.save(&item).await?;
        self.get_cart(user_id, DeliveryOption::default()).await
    }

    pub async fn update_quantity(&self, user_id: Uuid, item_id: Uuid, quantity: i64) -> Result<CartView, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }
        let mut item = self.owned_item(user_id, item_id).await?.ok_or(CartError::ItemNotFound)?;
        let target = self.boxes.get(item.box_id).await?.ok_or(CartError::BoxNotFound)?;

        let quantity = quantity.min(u32::MAX as i64) as u32;
        if quantity > target.stock {
            return Err(CartError::OutOfStock { name: target.name, available: target.stock });
        }

        item.quantity = quantity;
        item.updated_at = Utc::now();
        self.items.save(&item).await?;
        self.get_cart(user_id, DeliveryOption::default()).await
    }

    /// Removing an item that is not in the cart succeeds without changes.
    pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<CartView, CartError> {
        if let Some(item) = self.owned_item(user_id, item_id).await? {
            self.items.delete(item.id).await?;
        }
        self.get_cart(user_id, DeliveryOption::default()).await
    }

    /// Items plus a summary derived from current box prices. A stored coupon
    /// that no longer resolves is dropped from the view.
    pub async fn get_cart(&self, user_id: Uuid, delivery: DeliveryOption) -> Result<CartView, CartError> {
        let snapshot = self.snapshot(user_id).await?;
        let lines = snapshot.lines();
        let (summary, coupon_code) = self.price(&lines, snapshot.coupon.as_ref(), delivery);
        Ok(CartView { items: lines, coupon_code, delivery, summary })
    }

    pub async fn clear(&self, user_id: Uuid) -> Result<(), CartError> {
        let snapshot = self.snapshot(user_id).await?;
        let mut batch = WriteBatch::new();
        for (item, _) in &snapshot.items {
            batch.delete::<CartItem>(item.id);
        }
        if snapshot.coupon.is_some() {
            batch.delete::<CartCoupon>(user_id);
        }
        if !batch.is_empty() {
            self.store.commit(batch).await?;
        }
        Ok(())
    }

    pub async fn apply_coupon(&self, user_id: Uuid, code: &str) -> Result<CartView, CartError> {
        let code = code.trim();
        self.pricing.resolve_coupon(code)?;
        self.coupons
            .save(&CartCoupon { user_id, code: code.to_string(), applied_at: Utc::now() })
            .await?;
        self.get_cart(user_id, DeliveryOption::default()).await
    }

    pub async fn remove_coupon(&self, user_id: Uuid) -> Result<CartView, CartError> {
        self.coupons.delete(user_id).await?;
        self.get_cart(user_id, DeliveryOption::default()).await
    }

    pub async fn snapshot(&self, user_id: Uuid) -> Result<CartSnapshot, CartError> {
        let items = self
            .items
            .select_any(FilterData::new().with_where(json!({ "user_id": user_id })))
            .await?;

        let box_ids: Vec<Uuid> = items.iter().map(|i| i.box_id).collect();
        let mut boxes: HashMap<Uuid, MysteryBox> = self
            .boxes
            .select_ids(&box_ids)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();

        let items = items
            .into_iter()
            .map(|item| {
                let b = boxes.remove(&item.box_id);
                (item, b)
            })
            .collect();

        let coupon = self.coupons.get(user_id).await?;
        Ok(CartSnapshot { items, coupon })
    }

    /// Summary for the given lines, returning the coupon code that applied.
    pub fn price(
        &self,
        lines: &[CartLine],
        coupon: Option<&CartCoupon>,
        delivery: DeliveryOption,
    ) -> (PriceSummary, Option<String>) {
        let price_lines: Vec<PriceLine> = lines.iter().map(|l| PriceLine::new(l.unit_price, l.quantity)).collect();

        if let Some(coupon) = coupon {
            if let Ok(summary) = self.pricing.compute_summary(&price_lines, Some(&coupon.code), delivery) {
                return (summary, Some(coupon.code.clone()));
            }
            tracing::warn!("Dropping stale coupon {} for user {}", coupon.code, coupon.user_id);
        }

        // Without a coupon nothing can fail.
        let summary = self
            .pricing
            .compute_summary(&price_lines, None, delivery)
            .unwrap_or_else(|_| empty_summary());
        (summary, None)
    }

    async fn owned_item(&self, user_id: Uuid, item_id: Uuid) -> Result<Option<CartItem>, CartError> {
        Ok(self.items.get(item_id).await?.filter(|i| i.user_id == user_id))
    }
}

fn empty_summary() -> PriceSummary {
    PriceSummary {
        item_count: 0,
        total_quantity: 0,
        subtotal: Decimal::ZERO,
        shipping: Decimal::ZERO,
        tax: Decimal::ZERO,
        discount: Decimal::ZERO,
        total: Decimal::ZERO,
    }
}

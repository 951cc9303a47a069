/// Shared types used across the codebase

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Access role carried in the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOption {
    #[default]
    Standard,
    Express,
}

/// Derived cart totals. Never persisted on its own; orders keep a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    pub item_count: u32,
    pub total_quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// Icon and CSS class used wherever a status is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusStyle {
    pub icon: &'static str,
    pub color_class: &'static str,
}

/// Paged list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let pages = if limit == 0 { 0 } else { total.div_ceil(limit as u64) as u32 };
        Self { items, total, page, limit, pages }
    }
}

/// Page/limit query parameters, 1-based.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl Pagination {
    /// Resolve to (page, limit, offset), clamping limit to `max_limit`.
    pub fn resolve(&self, default_limit: u32, max_limit: Option<u32>) -> (u32, u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let mut limit = self.limit.unwrap_or(default_limit).max(1);
        if let Some(max) = max_limit {
            limit = limit.min(max);
        }
        (page, limit, (page - 1).saturating_mul(limit))
    }
}

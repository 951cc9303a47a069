use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::store::{Collection, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Unisex,
    Kids,
}

/// Catalog listing for one purchasable mystery box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MysteryBox {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub occasion: Option<String>,
    pub gender: Option<Gender>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub original_price: Option<Decimal>,
    pub stock: u32,
    pub is_active: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Mean of `reviews`, two decimals.
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub reviews: Vec<Review>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub rating: u8,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MysteryBox {
    pub fn in_stock(&self, quantity: u32) -> bool {
        self.is_active && self.stock >= quantity
    }

    /// Append a review and recompute the average from every stored rating.
    pub fn add_review(&mut self, review: Review) {
        self.reviews.push(review);
        self.review_count = self.reviews.len() as u32;
        let sum: u32 = self.reviews.iter().map(|r| u32::from(r.rating)).sum();
        let average = f64::from(sum) / f64::from(self.review_count);
        self.rating = (average * 100.0).round() / 100.0;
    }
}

impl Document for MysteryBox {
    const COLLECTION: Collection = Collection::Boxes;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Lowercase, hyphen-separated slug.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

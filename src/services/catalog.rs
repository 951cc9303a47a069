use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::config::FilterConfig;
use crate::database::models::mystery_box::slugify;
use crate::database::models::{Gender, MysteryBox, Review};
use crate::database::{DatabaseError, DocumentStore, Repository};
use crate::filter::FilterData;
use crate::types::{Page, Pagination};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Box not found: {0}")]
    NotFound(String),
    #[error("Slug already in use: {0}")]
    SlugTaken(String),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("{0}")]
    Invalid(String),
    #[error("You have already reviewed this box")]
    AlreadyReviewed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxSort {
    Newest,
    PriceAsc,
    PriceDesc,
    Rating,
    Popular,
    Name,
}

impl BoxSort {
    fn order(&self) -> &'static str {
        match self {
            BoxSort::Newest => "created_at desc",
            BoxSort::PriceAsc => "price asc",
            BoxSort::PriceDesc => "price desc",
            BoxSort::Rating => "rating desc",
            BoxSort::Popular => "review_count desc",
            BoxSort::Name => "name asc",
        }
    }
}

/// Listing query for `GET /api/boxes` and the admin listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoxQuery {
    pub category: Option<String>,
    pub occasion: Option<String>,
    pub gender: Option<Gender>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
    pub sort: Option<BoxSort>,
    /// Admin listing only; the public listing is always active-only.
    pub active: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl BoxQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination { page: self.page, limit: self.limit }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoxInput {
    pub name: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub occasion: Option<String>,
    pub gender: Option<Gender>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoxPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub occasion: Option<String>,
    pub gender: Option<Gender>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub original_price: Option<Decimal>,
    pub stock: Option<u32>,
    pub is_active: Option<bool>,
    pub images: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    pub rating: u8,
    pub title: Option<String>,
    pub comment: Option<String>,
}

const RELATED_LIMIT: u32 = 4;

#[derive(Clone)]
pub struct CatalogService {
    boxes: Repository<MysteryBox>,
    filter: FilterConfig,
}

impl CatalogService {
    pub fn new(store: Arc<dyn DocumentStore>, filter: FilterConfig) -> Self {
        Self { boxes: Repository::new(store), filter }
    }

    /// Public listing: active boxes only.
    pub async fn list(&self, query: &BoxQuery) -> Result<Page<MysteryBox>, CatalogError> {
        self.list_where(query, Some(true)).await
    }

    pub async fn admin_list(&self, query: &BoxQuery) -> Result<Page<MysteryBox>, CatalogError> {
        self.list_where(query, query.active).await
    }

    async fn list_where(&self, query: &BoxQuery, active: Option<bool>) -> Result<Page<MysteryBox>, CatalogError> {
        let where_clause = build_where(query, active);
        let (page, limit, offset) = query
            .pagination()
            .resolve(self.filter.default_limit, self.filter.max_limit);

        let total = self
            .boxes
            .count(FilterData::new().with_where(where_clause.clone()))
            .await?;
        let items = self
            .boxes
            .select_any(
                FilterData::new()
                    .with_where(where_clause)
                    .with_order(query.sort.unwrap_or(BoxSort::Newest).order())
                    .with_limit(limit, Some(offset)),
            )
            .await?;

        if self.filter.debug_logging {
            tracing::debug!("Box listing matched {} (page {} of limit {})", total, page, limit);
        }
        Ok(Page::new(items, total, page, limit))
    }

    pub async fn get(&self, id: Uuid) -> Result<MysteryBox, CatalogError> {
        self.boxes
            .get(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// Active box by slug.
    pub async fn get_by_slug(&self, slug: &str) -> Result<MysteryBox, CatalogError> {
        self.find_slug(slug)
            .await?
            .filter(|b| b.is_active)
            .ok_or_else(|| CatalogError::NotFound(slug.to_string()))
    }

    /// Other active boxes sharing the category or the occasion, best rated first.
    pub async fn related(&self, slug: &str, limit: Option<u32>) -> Result<Vec<MysteryBox>, CatalogError> {
        let target = self.get_by_slug(slug).await?;

        let mut shared = vec![json!({ "category": target.category })];
        if let Some(occasion) = &target.occasion {
            shared.push(json!({ "occasion": occasion }));
        }

        let related = self
            .boxes
            .select_any(
                FilterData::new()
                    .with_where(json!({
                        "is_active": true,
                        "id": { "$ne": target.id },
                        "$or": shared,
                    }))
                    .with_order("rating desc")
                    .with_limit(limit.unwrap_or(RELATED_LIMIT).clamp(1, 20), None),
            )
            .await?;
        Ok(related)
    }

    pub async fn reviews(&self, slug: &str) -> Result<Vec<Review>, CatalogError> {
        Ok(self.get_by_slug(slug).await?.reviews)
    }

    /// One review per user; updates the running average.
    pub async fn add_review(
        &self,
        slug: &str,
        user_id: Uuid,
        user_name: &str,
        input: ReviewInput,
    ) -> Result<MysteryBox, CatalogError> {
        if !(1..=5).contains(&input.rating) {
            return Err(CatalogError::Invalid("Rating must be between 1 and 5".to_string()));
        }

        let mut target = self.get_by_slug(slug).await?;
        if target.reviews.iter().any(|r| r.user_id == user_id) {
            return Err(CatalogError::AlreadyReviewed);
        }

        target.add_review(Review {
            id: Uuid::now_v7(),
            user_id,
            user_name: user_name.to_string(),
            rating: input.rating,
            title: trimmed(input.title),
            comment: trimmed(input.comment),
            created_at: Utc::now(),
        });
        target.updated_at = Utc::now();
        self.boxes.save(&target).await?;
        Ok(target)
    }

    pub async fn create(&self, input: BoxInput) -> Result<MysteryBox, CatalogError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(CatalogError::MissingField("name"));
        }
        if input.category.trim().is_empty() {
            return Err(CatalogError::MissingField("category"));
        }
        validate_price(input.price)?;

        let slug = match input.slug.as_deref().map(slugify).filter(|s| !s.is_empty()) {
            Some(slug) => slug,
            None => slugify(&name),
        };
        if slug.is_empty() {
            return Err(CatalogError::Invalid("Name must contain letters or digits".to_string()));
        }
        self.ensure_slug_free(&slug, None).await?;

        let now = Utc::now();
        let created = MysteryBox {
            id: Uuid::now_v7(),
            name,
            slug,
            description: input.description,
            category: input.category.trim().to_lowercase(),
            occasion: trimmed(input.occasion).map(|o| o.to_lowercase()),
            gender: input.gender,
            price: input.price,
            original_price: input.original_price,
            stock: input.stock,
            is_active: input.is_active,
            images: input.images,
            tags: input.tags,
            rating: 0.0,
            review_count: 0,
            reviews: vec![],
            created_at: now,
            updated_at: now,
        };
        self.boxes.save(&created).await?;
        info!("Created box {} ({})", created.slug, created.id);
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, patch: BoxPatch) -> Result<MysteryBox, CatalogError> {
        let mut current = self.get(id).await?;

        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(CatalogError::MissingField("name"));
            }
            current.name = name;
        }
        if let Some(slug) = patch.slug {
            let slug = slugify(&slug);
            if slug.is_empty() {
                return Err(CatalogError::Invalid("Slug must contain letters or digits".to_string()));
            }
            if slug != current.slug {
                self.ensure_slug_free(&slug, Some(id)).await?;
                current.slug = slug;
            }
        }
        if let Some(description) = patch.description {
            current.description = description;
        }
        if let Some(category) = patch.category {
            if category.trim().is_empty() {
                return Err(CatalogError::MissingField("category"));
            }
            current.category = category.trim().to_lowercase();
        }
        if let Some(occasion) = patch.occasion {
            current.occasion = trimmed(Some(occasion)).map(|o| o.to_lowercase());
        }
        if let Some(gender) = patch.gender {
            current.gender = Some(gender);
        }
        if let Some(price) = patch.price {
            validate_price(price)?;
            current.price = price;
        }
        if let Some(original_price) = patch.original_price {
            current.original_price = Some(original_price);
        }
        if let Some(stock) = patch.stock {
            current.stock = stock;
        }
        if let Some(is_active) = patch.is_active {
            current.is_active = is_active;
        }
        if let Some(images) = patch.images {
            current.images = images;
        }
        if let Some(tags) = patch.tags {
            current.tags = tags;
        }

        current.updated_at = Utc::now();
        self.boxes.save(&current).await?;
        Ok(current)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), CatalogError> {
        let existing = self.get(id).await?;
        self.boxes.delete(existing.id).await?;
        info!("Deleted box {} ({})", existing.slug, existing.id);
        Ok(())
    }

    async fn find_slug(&self, slug: &str) -> Result<Option<MysteryBox>, CatalogError> {
        Ok(self
            .boxes
            .select_one(FilterData::new().with_where(json!({ "slug": slug })))
            .await?)
    }

    async fn ensure_slug_free(&self, slug: &str, except: Option<Uuid>) -> Result<(), CatalogError> {
        match self.find_slug(slug).await? {
            Some(existing) if Some(existing.id) != except => Err(CatalogError::SlugTaken(slug.to_string())),
            _ => Ok(()),
        }
    }
}

fn build_where(query: &BoxQuery, active: Option<bool>) -> Value {
    let mut clause = Map::new();

    if let Some(active) = active {
        clause.insert("is_active".into(), json!(active));
    }
    if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty() && *c != "all") {
        clause.insert("category".into(), json!(category.to_lowercase()));
    }
    if let Some(occasion) = query.occasion.as_deref().filter(|o| !o.is_empty() && *o != "all") {
        clause.insert("occasion".into(), json!(occasion.to_lowercase()));
    }
    if let Some(gender) = query.gender {
        clause.insert("gender".into(), json!(gender));
    }

    let mut price = Map::new();
    if let Some(min) = query.min_price {
        price.insert("$gte".into(), json!(min));
    }
    if let Some(max) = query.max_price {
        price.insert("$lte".into(), json!(max));
    }
    if !price.is_empty() {
        clause.insert("price".into(), Value::Object(price));
    }

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.replace(['%', '_'], ""));
        clause.insert(
            "$or".into(),
            json!([
                { "name": { "$ilike": pattern } },
                { "description": { "$ilike": pattern } },
                { "category": { "$ilike": pattern } },
            ]),
        );
    }

    Value::Object(clause)
}

/// Keeps `price × stock` well inside `Decimal` range.
const MAX_BOX_PRICE: i64 = 10_000_000;

fn validate_price(price: Decimal) -> Result<(), CatalogError> {
    if price < Decimal::ZERO {
        return Err(CatalogError::Invalid("Price cannot be negative".to_string()));
    }
    if price > Decimal::from(MAX_BOX_PRICE) {
        return Err(CatalogError::Invalid(format!("Price cannot exceed {}", MAX_BOX_PRICE)));
    }
    Ok(())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

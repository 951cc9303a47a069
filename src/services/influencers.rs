use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::config::FilterConfig;
use crate::database::models::{Influencer, InfluencerStatus, Platform};
use crate::database::{DatabaseError, DocumentStore, Repository};
use crate::filter::FilterData;
use crate::types::{Page, Pagination};

#[derive(Debug, thiserror::Error)]
pub enum InfluencerError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("{0}")]
    Invalid(String),
    #[error("An influencer with email {0} already exists")]
    EmailTaken(String),
    #[error("Influencer not found")]
    NotFound,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InfluencerInput {
    pub name: Option<String>,
    pub handle: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub platform: Option<Platform>,
    #[serde(default)]
    pub followers_number: u64,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub engagement_rate: Option<Decimal>,
    pub category: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub commission_rate: Option<Decimal>,
    pub last_campaign: Option<String>,
    pub bio: Option<String>,
    /// Honored for admin creation only.
    pub status: Option<InfluencerStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InfluencerPatch {
    pub name: Option<String>,
    pub handle: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub platform: Option<Platform>,
    pub followers_number: Option<u64>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub engagement_rate: Option<Decimal>,
    pub category: Option<String>,
    pub status: Option<InfluencerStatus>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub commission_rate: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_sales: Option<Decimal>,
    pub last_campaign: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfluencerSort {
    #[default]
    Newest,
    Followers,
    Engagement,
    Sales,
}

impl InfluencerSort {
    fn order(&self) -> &'static str {
        match self {
            InfluencerSort::Newest => "created_at desc",
            InfluencerSort::Followers => "followers_number desc",
            InfluencerSort::Engagement => "engagement_rate desc",
            InfluencerSort::Sales => "total_sales desc",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InfluencerQuery {
    pub status: Option<InfluencerStatus>,
    pub platform: Option<Platform>,
    pub category: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort: InfluencerSort,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Listing page plus the per-status counts shown above it.
#[derive(Debug, Clone, Serialize)]
pub struct InfluencerListing {
    #[serde(flatten)]
    pub page: Page<Influencer>,
    pub counts: BTreeMap<&'static str, u64>,
}

#[derive(Clone)]
pub struct InfluencerService {
    influencers: Repository<Influencer>,
    filter: FilterConfig,
}

impl InfluencerService {
    pub fn new(store: Arc<dyn DocumentStore>, filter: FilterConfig) -> Self {
        Self { influencers: Repository::new(store), filter }
    }

    /// Public application form. Always starts pending.
    pub async fn apply(&self, input: InfluencerInput) -> Result<Influencer, InfluencerError> {
        let influencer = self.insert(input, InfluencerStatus::Pending).await?;
        info!("Influencer application from {} ({})", influencer.handle, influencer.email);
        Ok(influencer)
    }

    /// Admin creation. Defaults to active.
    pub async fn create(&self, input: InfluencerInput) -> Result<Influencer, InfluencerError> {
        let status = input.status.unwrap_or(InfluencerStatus::Active);
        self.insert(input, status).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Influencer, InfluencerError> {
        self.influencers.get(id).await?.ok_or(InfluencerError::NotFound)
    }

    pub async fn list(&self, query: &InfluencerQuery) -> Result<InfluencerListing, InfluencerError> {
        let mut clause = Map::new();
        if let Some(status) = query.status {
            clause.insert("status".into(), json!(status));
        }
        if let Some(platform) = query.platform {
            clause.insert("platform".into(), json!(platform));
        }
        if let Some(category) = query.category.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            clause.insert("category".into(), json!({ "$ilike": category }));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.replace(['%', '_'], ""));
            clause.insert(
                "$or".into(),
                json!([
                    { "name": { "$ilike": pattern } },
                    { "handle": { "$ilike": pattern } },
                    { "email": { "$ilike": pattern } },
                ]),
            );
        }
        let where_clause = Value::Object(clause);

        let (page, limit, offset) = Pagination { page: query.page, limit: query.limit }
            .resolve(self.filter.default_limit, self.filter.max_limit);
        let total = self.influencers.count(FilterData::new().with_where(where_clause.clone())).await?;
        let items = self
            .influencers
            .select_any(
                FilterData::new()
                    .with_where(where_clause)
                    .with_order(query.sort.order())
                    .with_limit(limit, Some(offset)),
            )
            .await?;

        Ok(InfluencerListing { page: Page::new(items, total, page, limit), counts: self.counts_by_status().await? })
    }

    pub async fn update(&self, id: Uuid, patch: InfluencerPatch) -> Result<Influencer, InfluencerError> {
        let mut influencer = self.get(id).await?;

        if let Some(name) = patch.name {
            influencer.name = non_empty(name, "name")?;
        }
        if let Some(handle) = patch.handle {
            influencer.handle = non_empty(handle, "handle")?;
        }
        if let Some(email) = patch.email {
            let email = normalize_email(&email)?;
            if email != influencer.email {
                self.ensure_email_free(&email).await?;
            }
            influencer.email = email;
        }
        if let Some(phone) = patch.phone {
            influencer.phone = optional(phone);
        }
        if let Some(platform) = patch.platform {
            influencer.platform = platform;
        }
        if let Some(followers) = patch.followers_number {
            influencer.followers_number = followers;
        }
        if let Some(rate) = patch.engagement_rate {
            influencer.engagement_rate = percentage(rate, "engagement_rate")?;
        }
        if let Some(category) = patch.category {
            influencer.category = optional(category);
        }
        if let Some(status) = patch.status {
            if status != influencer.status {
                info!("Influencer {} {} -> {}", influencer.id, influencer.status.as_str(), status.as_str());
            }
            influencer.status = status;
        }
        if let Some(rate) = patch.commission_rate {
            influencer.commission_rate = percentage(rate, "commission_rate")?;
        }
        if let Some(sales) = patch.total_sales {
            if sales.is_sign_negative() {
                return Err(InfluencerError::Invalid("total_sales cannot be negative".into()));
            }
            influencer.total_sales = sales;
        }
        if let Some(campaign) = patch.last_campaign {
            influencer.last_campaign = optional(campaign);
        }
        if let Some(bio) = patch.bio {
            influencer.bio = optional(bio);
        }

        influencer.updated_at = Utc::now();
        self.influencers.save(&influencer).await?;
        Ok(influencer)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), InfluencerError> {
        let influencer = self.get(id).await?;
        self.influencers.delete(influencer.id).await?;
        Ok(())
    }

    /// Every status is present, zero included.
    pub async fn counts_by_status(&self) -> Result<BTreeMap<&'static str, u64>, InfluencerError> {
        let mut counts = BTreeMap::new();
        for status in InfluencerStatus::ALL {
            let n = self
                .influencers
                .count(FilterData::new().with_where(json!({ "status": status })))
                .await?;
            counts.insert(status.as_str(), n);
        }
        Ok(counts)
    }

    async fn insert(&self, input: InfluencerInput, status: InfluencerStatus) -> Result<Influencer, InfluencerError> {
        let name = required(input.name, "name")?;
        let handle = required(input.handle, "handle")?;
        let email = normalize_email(&required(input.email, "email")?)?;
        let platform = input.platform.ok_or(InfluencerError::MissingField("platform"))?;
        let engagement_rate = percentage(input.engagement_rate.unwrap_or_default(), "engagement_rate")?;
        let commission_rate = percentage(input.commission_rate.unwrap_or_default(), "commission_rate")?;

        self.ensure_email_free(&email).await?;

        let now = Utc::now();
        let influencer = Influencer {
            id: Uuid::now_v7(),
            name,
            handle,
            email,
            phone: input.phone.and_then(optional),
            platform,
            followers_number: input.followers_number,
            engagement_rate,
            category: input.category.and_then(optional),
            status,
            commission_rate,
            total_sales: Decimal::ZERO,
            last_campaign: input.last_campaign.and_then(optional),
            bio: input.bio.and_then(optional),
            created_at: now,
            updated_at: now,
        };
        self.influencers.save(&influencer).await?;
        Ok(influencer)
    }

    async fn ensure_email_free(&self, email: &str) -> Result<(), InfluencerError> {
        let taken = self
            .influencers
            .count(FilterData::new().with_where(json!({ "email": email })))
            .await?;
        if taken > 0 {
            return Err(InfluencerError::EmailTaken(email.to_string()));
        }
        Ok(())
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, InfluencerError> {
    value.and_then(optional).ok_or(InfluencerError::MissingField(field))
}

fn non_empty(value: String, field: &'static str) -> Result<String, InfluencerError> {
    optional(value).ok_or(InfluencerError::MissingField(field))
}

fn optional(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn normalize_email(email: &str) -> Result<String, InfluencerError> {
    let email = email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(InfluencerError::Invalid("Invalid email address".into()));
    }
    Ok(email)
}

fn percentage(value: Decimal, field: &str) -> Result<Decimal, InfluencerError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(InfluencerError::Invalid(format!("{} must be between 0 and 100", field)));
    }
    Ok(value)
}

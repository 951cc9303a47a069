use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::store::{Collection, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Instagram,
    Youtube,
    Facebook,
    Twitter,
    Tiktok,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfluencerStatus {
    Pending,
    Active,
    Inactive,
    Rejected,
}

impl InfluencerStatus {
    pub const ALL: [InfluencerStatus; 4] = [
        InfluencerStatus::Pending,
        InfluencerStatus::Active,
        InfluencerStatus::Inactive,
        InfluencerStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InfluencerStatus::Pending => "pending",
            InfluencerStatus::Active => "active",
            InfluencerStatus::Inactive => "inactive",
            InfluencerStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Influencer {
    pub id: Uuid,
    pub name: String,
    pub handle: String,
    pub email: String,
    pub phone: Option<String>,
    pub platform: Platform,
    pub followers_number: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub engagement_rate: Decimal,
    pub category: Option<String>,
    pub status: InfluencerStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub commission_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_sales: Decimal,
    pub last_campaign: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Influencer {
    const COLLECTION: Collection = Collection::Influencers;

    fn id(&self) -> Uuid {
        self.id
    }
}

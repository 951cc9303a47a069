use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::store::{Collection, Document};

/// One (user, box) line in a cart. Unique per pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub box_id: Uuid,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for CartItem {
    const COLLECTION: Collection = Collection::CartItems;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Coupon applied to a user's cart. Keyed by the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartCoupon {
    pub user_id: Uuid,
    pub code: String,
    pub applied_at: DateTime<Utc>,
}

impl Document for CartCoupon {
    const COLLECTION: Collection = Collection::CartCoupons;

    fn id(&self) -> Uuid {
        self.user_id
    }
}

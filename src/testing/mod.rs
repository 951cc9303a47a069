use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::database::models::mystery_box::slugify;
use crate::database::models::{Address, AddressType, MysteryBox, User};
use crate::database::{DocumentStore, MemoryStore, Repository};
use crate::services::addresses::AddressInput;
use crate::services::users::RegisterInput;
use crate::services::Services;

pub const TEST_PASSWORD: &str = "correct-horse";

/// Services wired to a fresh in-memory store, plus fixture helpers.
pub struct TestContext {
    pub store: Arc<dyn DocumentStore>,
    pub config: AppConfig,
    pub services: Services,
}

impl TestContext {
    pub fn new() -> Self {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let config = AppConfig::development();
        let services = Services::new(store.clone(), &config);
        Self { store, config, services }
    }

    pub async fn create_customer(&self, email: &str) -> User {
        self.services
            .users
            .register(RegisterInput {
                name: Some("Test Customer".into()),
                email: Some(email.into()),
                password: Some(TEST_PASSWORD.into()),
                phone: None,
            })
            .await
            .expect("register test customer")
    }

    pub async fn create_admin(&self, email: &str) -> User {
        self.services
            .users
            .ensure_admin(email, TEST_PASSWORD, "Test Admin")
            .await
            .expect("create test admin")
    }

    /// Active box in the "birthday" category. Written straight to the store.
    pub async fn create_box(&self, name: &str, price: &str, stock: u32) -> MysteryBox {
        let now = Utc::now();
        let b = MysteryBox {
            id: Uuid::now_v7(),
            name: name.to_string(),
            slug: slugify(name),
            description: format!("{} test box", name),
            category: "birthday".to_string(),
            occasion: None,
            gender: None,
            price: price.parse::<Decimal>().expect("test price"),
            original_price: None,
            stock,
            is_active: true,
            images: vec![format!("https://cdn.example.com/{}.jpg", slugify(name))],
            tags: vec![],
            rating: 0.0,
            review_count: 0,
            reviews: vec![],
            created_at: now,
            updated_at: now,
        };
        self.save_box(&b).await;
        b
    }

    pub async fn save_box(&self, b: &MysteryBox) {
        Repository::<MysteryBox>::new(self.store.clone())
            .save(b)
            .await
            .expect("save test box");
    }

    pub async fn create_address(&self, user_id: Uuid) -> Address {
        self.services
            .addresses
            .add(
                user_id,
                AddressInput {
                    address_type: AddressType::Home,
                    name: Some("Asha Rao".into()),
                    phone: Some("9876543210".into()),
                    line1: Some("12 MG Road".into()),
                    line2: None,
                    landmark: Some("Near the clock tower".into()),
                    city: Some("Pune".into()),
                    state: Some("Maharashtra".into()),
                    pincode: Some("411001".into()),
                    is_default: false,
                },
            )
            .await
            .expect("create test address")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

pub mod addresses;
pub mod analytics;
pub mod cart;
pub mod catalog;
pub mod influencers;
pub mod orders;
pub mod pricing;
pub mod support;
pub mod users;

pub use addresses::{AddressError, AddressService};
pub use analytics::AnalyticsService;
pub use cart::{CartError, CartService};
pub use catalog::{CatalogError, CatalogService};
pub use influencers::{InfluencerError, InfluencerService};
pub use orders::{OrderError, OrderService};
pub use pricing::{PricingEngine, PricingError};
pub use support::{SupportError, SupportService};
pub use users::{UserError, UserService};

use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::DocumentStore;

/// Every domain service, wired to one store. Cheap to clone.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub catalog: CatalogService,
    pub pricing: PricingEngine,
    pub cart: CartService,
    pub orders: OrderService,
    pub addresses: AddressService,
    pub support: SupportService,
    pub influencers: InfluencerService,
    pub analytics: AnalyticsService,
}

impl Services {
    pub fn new(store: Arc<dyn DocumentStore>, config: &AppConfig) -> Self {
        let pricing = PricingEngine::new(config.pricing.clone());
        let cart = CartService::new(store.clone(), pricing.clone());

        Self {
            users: UserService::new(store.clone(), config.security.password_cost),
            catalog: CatalogService::new(store.clone(), config.filter.clone()),
            orders: OrderService::new(store.clone(), cart.clone(), pricing.clone(), config.filter.clone()),
            addresses: AddressService::new(store.clone()),
            support: SupportService::new(store.clone(), config.filter.clone()),
            influencers: InfluencerService::new(store.clone(), config.filter.clone()),
            analytics: AnalyticsService::new(store, config.inventory.clone()),
            cart,
            pricing,
        }
    }
}

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::database::DocumentStore;
use crate::error::ApiError;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, require_admin};
use crate::services::Services;

/// Shared handler state. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: Arc<AppConfig>,
    pub services: Arc<Services>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: AppConfig) -> Self {
        let services = Services::new(store.clone(), &config);
        Self {
            store,
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(public_routes())
        .merge(user_routes(state.clone()))
        .merge(admin_routes(state.clone()))
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http());

    if state.config.security.enable_cors {
        router = router.layer(cors_layer(&state.config));
    }

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    use public::{auth, catalog, influencers, pricing, system, tracking};

    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/api/statuses", get(system::statuses))
        // Token acquisition
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        // Catalog
        .route("/api/boxes", get(catalog::list))
        .route("/api/boxes/:slug", get(catalog::show))
        .route("/api/boxes/:slug/related", get(catalog::related))
        .route("/api/boxes/:slug/reviews", get(catalog::reviews))
        .route("/api/pricing/quote", post(pricing::quote))
        .route("/api/orders/:id/tracking", get(tracking::show))
        .route("/api/influencers", post(influencers::apply))
}

fn user_routes(state: AppState) -> Router<AppState> {
    use protected::{account, addresses, cart, orders, reviews, support};

    Router::new()
        .route("/api/auth/me", get(account::me).put(account::update_me))
        .route("/api/auth/logout", post(account::logout))
        .route("/api/boxes/:slug/reviews", post(reviews::create))
        // Cart
        .route("/api/user/cart", get(cart::show).delete(cart::clear))
        .route("/api/user/cart/items", post(cart::add_item))
        .route("/api/user/cart/items/:id", put(cart::update_item).delete(cart::remove_item))
        .route("/api/user/cart/coupon", post(cart::apply_coupon).delete(cart::remove_coupon))
        // Orders
        .route("/api/user/checkout", post(orders::checkout))
        .route("/api/user/orders", get(orders::list))
        .route("/api/user/orders/:id", get(orders::show))
        .route("/api/user/orders/:id/cancel", post(orders::cancel))
        // Address book
        .route("/api/user/addresses", get(addresses::list).post(addresses::create))
        .route("/api/user/addresses/:id", put(addresses::update).delete(addresses::remove))
        .route("/api/user/addresses/:id/default", put(addresses::set_default))
        // Support
        .route("/api/user/support", get(support::list).post(support::create))
        .route("/api/user/support/:id", get(support::show))
        .route("/api/user/support/:id/messages", post(support::add_message))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    use elevated::{analytics, boxes, influencers, orders, support};

    Router::new()
        .route("/api/admin/analytics", get(analytics::dashboard))
        // Catalog management
        .route("/api/admin/boxes", get(boxes::list).post(boxes::create))
        .route("/api/admin/boxes/:id", get(boxes::show).put(boxes::update).delete(boxes::remove))
        // Orders
        .route("/api/admin/orders", get(orders::list))
        .route("/api/admin/orders/:id", get(orders::show))
        .route("/api/orders/:id/tracking", post(orders::append_tracking))
        // Support desk
        .route("/api/admin/support", get(support::list))
        .route("/api/admin/support/:id", get(support::show).put(support::update))
        .route("/api/admin/support/:id/reply", post(support::reply))
        // Influencers
        .route("/api/admin/influencers", get(influencers::list).post(influencers::create))
        .route(
            "/api/admin/influencers/:id",
            get(influencers::show).put(influencers::update).delete(influencers::remove),
        )
        // Layers run bottom-up: authenticate first, then check the role.
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() || config.security.cors_origins.iter().any(|o| o == "*") {
        base.allow_origin(Any)
    } else {
        base.allow_origin(origins)
    }
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

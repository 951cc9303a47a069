// handlers/public/system.rs - service info, health and the status style table

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::status::style_table;
use crate::middleware::ApiResponse;

/// GET / - service description and endpoint map
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Surprise Tokri API",
            "version": version,
            "description": "Mystery box storefront backend",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "statuses": "/api/statuses (public)",
                "auth": "/api/auth/register, /api/auth/login (public); /api/auth/me, /api/auth/logout (user)",
                "catalog": "/api/boxes[/:slug[/related|/reviews]] (public)",
                "pricing": "/api/pricing/quote (public)",
                "tracking": "/api/orders/:id/tracking (public GET, admin POST)",
                "influencers": "/api/influencers (public application)",
                "user": "/api/user/{cart,checkout,orders,addresses,support} (user)",
                "admin": "/api/admin/{analytics,boxes,orders,support,influencers} (admin)",
            }
        }
    }))
}

/// GET /health - store ping; 503 when the store is unreachable
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let backend = state.store.backend_name();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": backend
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "Database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": backend
                    }
                })),
            )
        }
    }
}

/// GET /api/statuses - icon and CSS class for every order and ticket status
pub async fn statuses() -> ApiResponse<Value> {
    ApiResponse::success(style_table())
}

// handlers/elevated/mod.rs - Admin back office
//
// Runs behind `jwt_auth_middleware` and `require_admin`.

pub mod analytics; // GET /api/admin/analytics
pub mod boxes; // /api/admin/boxes
pub mod influencers; // /api/admin/influencers
pub mod orders; // /api/admin/orders, POST /api/orders/:id/tracking
pub mod support; // /api/admin/support

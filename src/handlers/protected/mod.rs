// handlers/protected/mod.rs - Endpoints for any signed-in user
//
// Every handler here runs behind `jwt_auth_middleware` and reads the caller
// from the `AuthUser` request extension.

pub mod account; // /api/auth/me, /api/auth/logout
pub mod addresses; // /api/user/addresses
pub mod cart; // /api/user/cart
pub mod orders; // /api/user/checkout, /api/user/orders
pub mod reviews; // POST /api/boxes/:slug/reviews
pub mod support; // /api/user/support

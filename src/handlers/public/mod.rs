// handlers/public/mod.rs - Endpoints that do not require authentication

pub mod auth; // POST /api/auth/register, /api/auth/login
pub mod catalog; // GET /api/boxes...
pub mod influencers; // POST /api/influencers
pub mod pricing; // POST /api/pricing/quote
pub mod system; // GET /, /health, /api/statuses
pub mod tracking; // GET /api/orders/:id/tracking

// handlers/mod.rs - HTTP handlers grouped by access level
//
// public/     no token
// protected/  valid JWT, any role
// elevated/   valid JWT with the admin role

pub mod elevated;
pub mod protected;
pub mod public;

pub mod admin;
pub mod migrate;
pub mod seed;
pub mod token;

pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::Repository;
pub use store::{Collection, DatabaseError, Document, DocumentStore, WriteBatch};

use std::sync::Arc;

use crate::config::DatabaseConfig;

/// Pick the backend from config: Postgres when a URL is set, memory otherwise.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn DocumentStore>, DatabaseError> {
    match config.url {
        Some(_) => {
            let store = PgStore::connect(config).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory document store (data is not persisted)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

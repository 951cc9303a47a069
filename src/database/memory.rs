use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::store::{Collection, DatabaseError, DocumentStore, Write, WriteBatch};
use crate::filter::{Filter, FilterData};

/// Process-local store for development and tests.
/// Documents are keyed by UUIDv7 so map order is creation order.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, BTreeMap<Uuid, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: Collection, filter: &FilterData) -> Result<Vec<Value>, DatabaseError> {
        let filter = Filter::from_data(filter)?;
        let collections = self.collections.read().await;
        let docs = collections
            .get(&collection)
            .map(|c| c.values().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(filter.apply(docs))
    }

    async fn count(&self, collection: Collection, filter: &FilterData) -> Result<u64, DatabaseError> {
        let filter = Filter::from_data(filter)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|c| filter.count(c.values()))
            .unwrap_or(0))
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Value>, DatabaseError> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).and_then(|c| c.get(&id)).cloned())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), DatabaseError> {
        // Bodies are serialized before we get here, so applying cannot fail halfway.
        let mut collections = self.collections.write().await;
        for write in batch.into_writes() {
            match write {
                Write::Put { collection, id, body } => {
                    collections.entry(collection).or_default().insert(id, body);
                }
                Write::Delete { collection, id } => {
                    if let Some(docs) = collections.get_mut(&collection) {
                        docs.remove(&id);
                    }
                }
            }
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::database::store::{DatabaseError, Document, DocumentStore, WriteBatch};
use crate::filter::FilterData;

/// Typed access to one collection of the document store.
pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _phantom: PhantomData<T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone(), _phantom: PhantomData }
    }
}

impl<T: Document> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store, _phantom: PhantomData }
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        let docs = self.store.find(T::COLLECTION, &filter_data).await?;
        docs.into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(DatabaseError::from))
            .collect()
    }

    pub async fn select_one(&self, filter_data: FilterData) -> Result<Option<T>, DatabaseError> {
        let filter_data = FilterData { limit: Some(1), ..filter_data };
        Ok(self.select_any(filter_data).await?.into_iter().next())
    }

    pub async fn count(&self, filter_data: FilterData) -> Result<u64, DatabaseError> {
        self.store.count(T::COLLECTION, &filter_data).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        match self.store.get(T::COLLECTION, id).await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn select_ids(&self, ids: &[Uuid]) -> Result<Vec<T>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        self.select_any(FilterData::new().with_where(json!({ "id": { "$in": ids } })))
            .await
    }

    /// Insert or replace a single document.
    pub async fn save(&self, doc: &T) -> Result<(), DatabaseError> {
        let mut batch = WriteBatch::new();
        batch.put(doc)?;
        self.store.commit(batch).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut batch = WriteBatch::new();
        batch.delete::<T>(id);
        self.store.commit(batch).await
    }
}

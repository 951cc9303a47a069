use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::filter::{FilterData, FilterError};

/// Errors from the document store
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error("Document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Named document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    Boxes,
    CartItems,
    CartCoupons,
    Orders,
    Addresses,
    Tickets,
    Influencers,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Boxes => "boxes",
            Collection::CartItems => "cart_items",
            Collection::CartCoupons => "cart_coupons",
            Collection::Orders => "orders",
            Collection::Addresses => "addresses",
            Collection::Tickets => "tickets",
            Collection::Influencers => "influencers",
        }
    }
}

/// A fixed-schema record stored as one JSON document.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn id(&self) -> Uuid;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Put { collection: Collection, id: Uuid, body: Value },
    Delete { collection: Collection, id: Uuid },
}

/// Set of writes applied all-or-nothing by `DocumentStore::commit`.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put<T: Document>(&mut self, doc: &T) -> Result<&mut Self, DatabaseError> {
        let body = serde_json::to_value(doc)?;
        self.writes.push(Write::Put { collection: T::COLLECTION, id: doc.id(), body });
        Ok(self)
    }

    pub fn delete<T: Document>(&mut self, id: Uuid) -> &mut Self {
        self.writes.push(Write::Delete { collection: T::COLLECTION, id });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn from_writes(writes: Vec<Write>) -> Self {
        Self { writes }
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}

/// Persistence boundary. Each call is one round trip; `commit` is atomic.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, collection: Collection, filter: &FilterData) -> Result<Vec<Value>, DatabaseError>;

    async fn count(&self, collection: Collection, filter: &FilterData) -> Result<u64, DatabaseError>;

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Value>, DatabaseError>;

    async fn commit(&self, batch: WriteBatch) -> Result<(), DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;

    fn backend_name(&self) -> &'static str;
}

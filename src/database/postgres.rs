use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    postgres::{PgArguments, PgPoolOptions},
    types::Json,
    PgPool, Postgres,
};
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::database::store::{Collection, DatabaseError, DocumentStore, Write, WriteBatch};
use crate::filter::{Filter, FilterData, SqlParam};

const CREATE_DOCUMENTS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id UUID NOT NULL,
        body JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (collection, id)
    )";

const CREATE_BODY_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS documents_body_gin ON documents USING GIN (body jsonb_path_ops)";

/// Postgres-backed document store: one JSONB row per document.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let url = config.url.as_deref().ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await?;
        info!("Connected Postgres document store (max_connections={})", config.max_connections);
        Ok(Self { pool })
    }

    /// Create the documents table and index if missing.
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::query(CREATE_DOCUMENTS_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_BODY_INDEX).execute(&self.pool).await?;
        info!("Document schema is up to date");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn find(&self, collection: Collection, filter: &FilterData) -> Result<Vec<Value>, DatabaseError> {
        let sql = Filter::from_data(filter)?.to_sql();
        let mut q = sqlx::query_scalar::<_, Value>(&sql.query).bind(collection.as_str());
        for p in sql.params.iter() {
            q = bind_param_scalar(q, p);
        }
        Ok(q.fetch_all(&self.pool).await?)
    }

    async fn count(&self, collection: Collection, filter: &FilterData) -> Result<u64, DatabaseError> {
        let sql = Filter::from_data(filter)?.to_count_sql();
        let mut q = sqlx::query_scalar::<_, i64>(&sql.query).bind(collection.as_str());
        for p in sql.params.iter() {
            q = bind_param_scalar(q, p);
        }
        let count = q.fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Value>, DatabaseError> {
        let body = sqlx::query_scalar::<_, Value>("SELECT body FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(body)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), DatabaseError> {
        if batch.is_empty() {
            return Ok(());
        }

        // Dropping the transaction on error rolls everything back.
        let mut tx = self.pool.begin().await?;
        for write in batch.into_writes() {
            match write {
                Write::Put { collection, id, body } => {
                    sqlx::query(
                        "INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)
                         ON CONFLICT (collection, id)
                         DO UPDATE SET body = EXCLUDED.body, updated_at = now()",
                    )
                    .bind(collection.as_str())
                    .bind(id)
                    .bind(Json(body))
                    .execute(&mut *tx)
                    .await?;
                }
                Write::Delete { collection, id } => {
                    sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                        .bind(collection.as_str())
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

fn bind_param_scalar<'q, O>(
    q: sqlx::query::QueryScalar<'q, Postgres, O, PgArguments>,
    p: &'q SqlParam,
) -> sqlx::query::QueryScalar<'q, Postgres, O, PgArguments> {
    match p {
        SqlParam::Json(v) => q.bind(Json(v)),
        SqlParam::Text(s) => q.bind(s.as_str()),
    }
}

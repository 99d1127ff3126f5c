//! Keyed document store used for lookups and per-event state.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::DbPool;

/// Documents are free-form JSON objects.
pub type Document = serde_json::Value;

/// Collection/key addressed JSON document store.
///
/// Implementations are shared process-wide and must be safe for concurrent
/// use.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError>;

    /// Create or replace the document at `collection/key`.
    async fn put(&self, collection: &str, key: &str, document: &Document)
        -> Result<(), StoreError>;

    /// Cheap reachability probe for health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// [`DocumentStore`] backed by a Postgres `JSONB` table.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: DbPool,
}

impl PgDocumentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        let body = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT body FROM documents WHERE collection = $1 AND doc_key = $2",
        )
        .bind(collection)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(body)
    }

    async fn put(
        &self,
        collection: &str,
        key: &str,
        document: &Document,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO documents (collection, doc_key, body, updated_at) \
             VALUES ($1, $2, $3, NOW()) \
             ON CONFLICT (collection, doc_key) \
             DO UPDATE SET body = EXCLUDED.body, updated_at = NOW()",
        )
        .bind(collection)
        .bind(key)
        .bind(document)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }
}

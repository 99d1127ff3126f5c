//! Analytical warehouse client.

use async_trait::async_trait;
use ingest_core::types::{SequenceNumber, Timestamp};
use serde::Serialize;

use crate::error::StoreError;
use crate::DbPool;

/// One row in the `warehouse_events` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehouseRow {
    pub event_id: String,
    pub event_type: String,
    /// Hex SHA-256 of the raw message payload.
    pub digest: String,
    /// Correlation aid only; not unique across restarts.
    pub sequence: SequenceNumber,
    pub occurred_at: Option<Timestamp>,
    pub ingested_at: Timestamp,
    pub data: serde_json::Value,
}

/// Append-only analytical store.
///
/// Implementations are shared process-wide and must be safe for concurrent
/// use.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Insert a row. Returns `false` if a row with the same `event_id` was
    /// already present, in which case nothing is written.
    async fn insert_row(&self, row: &WarehouseRow) -> Result<bool, StoreError>;

    /// Digest of the stored row for `event_id`, if any.
    async fn stored_digest(&self, event_id: &str) -> Result<Option<String>, StoreError>;

    /// Cheap reachability probe for health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// [`Warehouse`] backed by a Postgres table.
#[derive(Debug, Clone)]
pub struct PgWarehouse {
    pool: DbPool,
}

impl PgWarehouse {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Warehouse for PgWarehouse {
    async fn insert_row(&self, row: &WarehouseRow) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO warehouse_events \
                 (event_id, event_type, digest, sequence, occurred_at, ingested_at, data) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (event_id) DO NOTHING",
        )
        .bind(&row.event_id)
        .bind(&row.event_type)
        .bind(&row.digest)
        .bind(row.sequence)
        .bind(row.occurred_at)
        .bind(row.ingested_at)
        .bind(&row.data)
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() == 1;
        if !inserted {
            tracing::debug!(event_id = %row.event_id, "Warehouse row already present");
        }
        Ok(inserted)
    }

    async fn stored_digest(&self, event_id: &str) -> Result<Option<String>, StoreError> {
        let digest = sqlx::query_scalar::<_, String>(
            "SELECT digest FROM warehouse_events WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(digest)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }
}

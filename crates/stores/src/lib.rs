//! Downstream store clients for the ingestion service.
//!
//! Two independent stores are consumed: an append-only analytical
//! [`Warehouse`] and a keyed [`DocumentStore`] used for lookups and
//! per-event state. Each has a Postgres implementation over its own pool and
//! an in-memory implementation for tests and local runs.

pub mod documents;
pub mod error;
pub mod memory;
pub mod warehouse;

use sqlx::postgres::PgPoolOptions;

pub use documents::{Document, DocumentStore, PgDocumentStore};
pub use error::StoreError;
pub use memory::{MemoryDocumentStore, MemoryWarehouse};
pub use warehouse::{PgWarehouse, Warehouse, WarehouseRow};

pub type DbPool = sqlx::PgPool;

/// Maximum connections per store pool.
const MAX_CONNECTIONS: u32 = 20;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to prove the pool can reach the server.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the warehouse schema.
///
/// Both stores may share one database in development, so each migrator
/// ignores versions that belong to the other.
pub async fn run_warehouse_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    let mut migrator = sqlx::migrate!("./migrations/warehouse");
    migrator.set_ignore_missing(true);
    migrator.run(pool).await
}

/// Apply the document store schema.
pub async fn run_document_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    let mut migrator = sqlx::migrate!("./migrations/documents");
    migrator.set_ignore_missing(true);
    migrator.run(pool).await
}

//! In-memory store implementations for tests and local runs.
//!
//! Both stores can be switched into a simulated outage with
//! `set_unavailable(true)`; every call then fails with
//! [`StoreError::Unavailable`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::documents::{Document, DocumentStore};
use crate::error::StoreError;
use crate::warehouse::{Warehouse, WarehouseRow};

const OUTAGE_MESSAGE: &str = "simulated outage";

/// Vector-backed [`Warehouse`]. Rows are unique by `event_id`.
#[derive(Debug, Default)]
pub struct MemoryWarehouse {
    rows: RwLock<Vec<WarehouseRow>>,
    unavailable: AtomicBool,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of all rows in insertion order.
    pub async fn rows(&self) -> Vec<WarehouseRow> {
        self.rows.read().await.clone()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(OUTAGE_MESSAGE.into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn insert_row(&self, row: &WarehouseRow) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut rows = self.rows.write().await;
        if rows.iter().any(|r| r.event_id == row.event_id) {
            return Ok(false);
        }
        rows.push(row.clone());
        Ok(true)
    }

    async fn stored_digest(&self, event_id: &str) -> Result<Option<String>, StoreError> {
        self.check_available()?;
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|r| r.event_id == event_id)
            .map(|r| r.digest.clone()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

/// HashMap-backed [`DocumentStore`].
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<(String, String), Document>>,
    unavailable: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of documents across all collections.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(OUTAGE_MESSAGE.into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        self.check_available()?;
        let documents = self.documents.read().await;
        Ok(documents
            .get(&(collection.to_string(), key.to_string()))
            .cloned())
    }

    async fn put(
        &self,
        collection: &str,
        key: &str,
        document: &Document,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        self.documents
            .write()
            .await
            .insert((collection.to_string(), key.to_string()), document.clone());
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

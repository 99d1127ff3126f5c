//! Production job: ingest one [`IngestEvent`] into the warehouse and record
//! its state in the document store.
//!
//! Idempotence is keyed on the payload digest, never on the process-local
//! sequence number. A redelivered message whose digest matches the recorded
//! state succeeds without writing; the same `event_id` with different
//! content is a permanent [`JobError::Conflict`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use ingest_core::error::JobError;
use ingest_core::types::SequenceNumber;
use ingest_stores::{DocumentStore, Warehouse, WarehouseRow};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::event::IngestEvent;
use crate::job::{ExecutionContext, Job, JobFactory};

/// Document collection holding one state document per ingested event.
pub const STATE_COLLECTION: &str = "ingest_state";

/// Hex-encoded SHA-256 of `payload`.
pub fn payload_digest(payload: &[u8]) -> String {
    format!("{:x}", Sha256::digest(payload))
}

/// Builds [`EventJob`]s. Stateless; share one instance process-wide.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventJobFactory;

#[async_trait]
impl JobFactory for EventJobFactory {
    async fn create(
        &self,
        payload: Vec<u8>,
        sequence: SequenceNumber,
        warehouse: Arc<dyn Warehouse>,
        documents: Arc<dyn DocumentStore>,
    ) -> Result<Box<dyn Job>, JobError> {
        let event = IngestEvent::decode(&payload)?;
        let digest = payload_digest(&payload);

        tracing::debug!(
            sequence,
            event_id = %event.event_id,
            event_type = %event.event_type,
            "Event job created",
        );

        Ok(Box::new(EventJob {
            event,
            digest,
            sequence,
            warehouse,
            documents,
        }))
    }
}

pub struct EventJob {
    event: IngestEvent,
    digest: String,
    sequence: SequenceNumber,
    warehouse: Arc<dyn Warehouse>,
    documents: Arc<dyn DocumentStore>,
}

#[async_trait]
impl Job for EventJob {
    async fn process(&self, ctx: &ExecutionContext) -> Result<(), JobError> {
        let event_id = self.event.event_id.as_str();

        let existing = ctx
            .run(self.documents.get(STATE_COLLECTION, event_id))
            .await?;
        if let Some(state) = existing {
            let recorded = state.get("digest").and_then(|d| d.as_str());
            if recorded == Some(self.digest.as_str()) {
                tracing::info!(
                    sequence = self.sequence,
                    event_id,
                    "Event already ingested, skipping",
                );
                return Ok(());
            }
            return Err(JobError::Conflict(format!(
                "event {event_id} was already ingested with different content"
            )));
        }

        let ingested_at = Utc::now();
        let row = WarehouseRow {
            event_id: self.event.event_id.clone(),
            event_type: self.event.event_type.clone(),
            digest: self.digest.clone(),
            sequence: self.sequence,
            occurred_at: self.event.occurred_at,
            ingested_at,
            data: self.event.data.clone(),
        };
        let inserted = ctx.run(self.warehouse.insert_row(&row)).await?;
        if !inserted {
            // Row left by an earlier delivery whose state write never landed,
            // or by a concurrent delivery of the same event.
            let stored = ctx.run(self.warehouse.stored_digest(event_id)).await?;
            match stored {
                Some(digest) if digest == self.digest => {}
                Some(_) => {
                    return Err(JobError::Conflict(format!(
                        "event {event_id} is already in the warehouse with different content"
                    )));
                }
                None => {
                    return Err(JobError::Internal(format!(
                        "warehouse rejected event {event_id} but holds no row for it"
                    )));
                }
            }
        }

        let state = json!({
            "digest": self.digest,
            "event_type": self.event.event_type,
            "sequence": self.sequence,
            "ingested_at": ingested_at,
        });
        ctx.run(self.documents.put(STATE_COLLECTION, event_id, &state))
            .await?;

        tracing::info!(
            sequence = self.sequence,
            event_id,
            event_type = %self.event.event_type,
            warehouse_inserted = inserted,
            "Event ingested",
        );
        Ok(())
    }
}

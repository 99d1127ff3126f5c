//! Integration tests for [`EventJobFactory`] and [`EventJob`] against the
//! in-memory stores.

use std::sync::Arc;

use assert_matches::assert_matches;
use ingest_core::error::{JobError, Retryability};
use chrono::Utc;
use ingest_jobs::event_job::payload_digest;
use ingest_jobs::{EventJobFactory, ExecutionContext, Job, JobFactory, STATE_COLLECTION};
use ingest_stores::{DocumentStore, MemoryDocumentStore, MemoryWarehouse, Warehouse, WarehouseRow};
use serde_json::json;
use tokio_util::sync::CancellationToken;

struct Harness {
    warehouse: Arc<MemoryWarehouse>,
    documents: Arc<MemoryDocumentStore>,
}

impl Harness {
    fn new() -> Self {
        Self {
            warehouse: Arc::new(MemoryWarehouse::new()),
            documents: Arc::new(MemoryDocumentStore::new()),
        }
    }

    async fn create(&self, payload: &[u8], sequence: i64) -> Result<Box<dyn Job>, JobError> {
        EventJobFactory
            .create(
                payload.to_vec(),
                sequence,
                self.warehouse.clone(),
                self.documents.clone(),
            )
            .await
    }

    async fn run(&self, payload: &[u8], sequence: i64) -> Result<(), JobError> {
        let job = self.create(payload, sequence).await?;
        job.process(&ExecutionContext::new(sequence, CancellationToken::new()))
            .await
    }
}

fn event_payload(event_id: &str, status: &str) -> Vec<u8> {
    json!({
        "event_id": event_id,
        "event_type": "application.status_changed",
        "occurred_at": "2026-01-05T10:00:00Z",
        "data": {"status": status}
    })
    .to_string()
    .into_bytes()
}

// ---------------------------------------------------------------------------
// Test: a valid event lands in both stores
// ---------------------------------------------------------------------------

#[tokio::test]
async fn valid_event_is_written_to_warehouse_and_state() {
    let h = Harness::new();

    h.run(&event_payload("e-1", "applied"), 2).await.unwrap();

    let rows = h.warehouse.rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event_id, "e-1");
    assert_eq!(rows[0].sequence, 2);
    assert_eq!(rows[0].data["status"], "applied");
    assert!(rows[0].occurred_at.is_some());

    let state = h
        .documents
        .get(STATE_COLLECTION, "e-1")
        .await
        .unwrap()
        .expect("state document should exist");
    assert_eq!(state["digest"], rows[0].digest.as_str());
    assert_eq!(state["sequence"], 2);
}

// ---------------------------------------------------------------------------
// Test: construction failures are permanent
// ---------------------------------------------------------------------------

#[tokio::test]
async fn undecodable_payload_fails_creation_non_retryably() {
    let h = Harness::new();

    let err = h.create(b"hello", 2).await.err().unwrap();

    assert_matches!(err, JobError::MalformedPayload(_));
    assert_eq!(err.retryability(), Retryability::NonRetryable);
    assert!(h.warehouse.rows().await.is_empty());
}

#[tokio::test]
async fn invalid_event_fails_creation_non_retryably() {
    let h = Harness::new();

    let err = h
        .create(br#"{"event_id":"","event_type":"x"}"#, 2)
        .await
        .err()
        .unwrap();

    assert_matches!(err, JobError::Validation(_));
    assert_eq!(err.retryability(), Retryability::NonRetryable);
}

// ---------------------------------------------------------------------------
// Test: redelivery of identical content is idempotent
// ---------------------------------------------------------------------------

#[tokio::test]
async fn redelivered_identical_event_succeeds_without_rewriting() {
    let h = Harness::new();
    let payload = event_payload("e-1", "applied");

    h.run(&payload, 2).await.unwrap();
    h.run(&payload, 9).await.unwrap();

    let rows = h.warehouse.rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].sequence, 2, "first delivery's row is kept");

    let state = h.documents.get(STATE_COLLECTION, "e-1").await.unwrap().unwrap();
    assert_eq!(state["sequence"], 2);
}

// ---------------------------------------------------------------------------
// Test: same event id with different content is a permanent conflict
// ---------------------------------------------------------------------------

#[tokio::test]
async fn conflicting_content_for_same_event_is_non_retryable() {
    let h = Harness::new();

    h.run(&event_payload("e-1", "applied"), 2).await.unwrap();
    let err = h.run(&event_payload("e-1", "rejected"), 3).await.unwrap_err();

    assert_matches!(err, JobError::Conflict(_));
    assert_eq!(err.retryability(), Retryability::NonRetryable);
    assert_eq!(h.warehouse.rows().await.len(), 1);
}

// ---------------------------------------------------------------------------
// Test: a warehouse row without a state document still guards the event
// ---------------------------------------------------------------------------

async fn seed_warehouse_row(h: &Harness, payload: &[u8], sequence: i64) {
    let row = WarehouseRow {
        event_id: "e-1".to_string(),
        event_type: "application.status_changed".to_string(),
        digest: payload_digest(payload),
        sequence,
        occurred_at: None,
        ingested_at: Utc::now(),
        data: json!({"status": "applied"}),
    };
    assert!(h.warehouse.insert_row(&row).await.unwrap());
}

#[tokio::test]
async fn different_content_over_orphan_warehouse_row_is_a_conflict() {
    let h = Harness::new();
    let original = event_payload("e-1", "applied");
    seed_warehouse_row(&h, &original, 2).await;

    let err = h.run(&event_payload("e-1", "rejected"), 3).await.unwrap_err();

    assert_matches!(err, JobError::Conflict(_));
    assert_eq!(err.retryability(), Retryability::NonRetryable);
    assert!(h.documents.is_empty().await, "no state recorded for rejected content");
    assert_eq!(h.warehouse.rows().await[0].data["status"], "applied");

    h.run(&original, 4).await.unwrap();
    let state = h.documents.get(STATE_COLLECTION, "e-1").await.unwrap().unwrap();
    assert_eq!(state["digest"], payload_digest(&original));
}

#[tokio::test]
async fn same_content_over_orphan_warehouse_row_completes_state() {
    let h = Harness::new();
    let payload = event_payload("e-1", "applied");
    seed_warehouse_row(&h, &payload, 2).await;

    h.run(&payload, 3).await.unwrap();

    assert_eq!(h.warehouse.rows().await.len(), 1);
    let state = h.documents.get(STATE_COLLECTION, "e-1").await.unwrap().unwrap();
    assert_eq!(state["digest"], payload_digest(&payload));
}

// ---------------------------------------------------------------------------
// Test: store outages are retryable and a retry completes the work
// ---------------------------------------------------------------------------

#[tokio::test]
async fn warehouse_outage_is_retryable_and_recovers() {
    let h = Harness::new();
    let payload = event_payload("e-1", "applied");

    h.warehouse.set_unavailable(true);
    let err = h.run(&payload, 2).await.unwrap_err();
    assert_matches!(err, JobError::Unavailable(_));
    assert!(err.retryability().is_retryable());
    assert!(h.documents.is_empty().await, "no state written on failure");

    h.warehouse.set_unavailable(false);
    h.run(&payload, 3).await.unwrap();
    assert_eq!(h.warehouse.rows().await.len(), 1);
}

#[tokio::test]
async fn document_store_outage_is_retryable_and_recovers() {
    let h = Harness::new();
    let payload = event_payload("e-1", "applied");

    h.documents.set_unavailable(true);
    let err = h.run(&payload, 2).await.unwrap_err();
    assert_matches!(err, JobError::Unavailable(_));
    assert!(h.warehouse.rows().await.is_empty());

    h.documents.set_unavailable(false);
    h.run(&payload, 3).await.unwrap();
    h.run(&payload, 4).await.unwrap();

    assert_eq!(h.warehouse.rows().await.len(), 1);
}

// ---------------------------------------------------------------------------
// Test: a cancelled context aborts processing with a retryable error
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancelled_context_aborts_processing() {
    let h = Harness::new();
    let job = h.create(&event_payload("e-1", "applied"), 2).await.unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let err = job
        .process(&ExecutionContext::new(2, token))
        .await
        .unwrap_err();

    assert_matches!(err, JobError::Cancelled);
    assert!(err.retryability().is_retryable());
    assert!(h.warehouse.rows().await.is_empty());
}

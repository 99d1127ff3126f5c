//! Decoded message payload.

use ingest_core::error::JobError;
use ingest_core::types::Timestamp;
use serde::Deserialize;
use validator::Validate;

/// A single application event carried in a message payload.
///
/// ```json
/// {
///   "event_id": "app-123:status:4",
///   "event_type": "application.status_changed",
///   "occurred_at": "2026-01-05T10:00:00Z",
///   "data": { "status": "interviewing" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct IngestEvent {
    /// Producer-assigned identity, stable across redeliveries.
    #[validate(length(min = 1, max = 128))]
    pub event_id: String,

    #[validate(length(min = 1, max = 64))]
    pub event_type: String,

    #[serde(default)]
    pub occurred_at: Option<Timestamp>,

    #[serde(default = "empty_object")]
    pub data: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

impl IngestEvent {
    /// Decode and validate a raw payload.
    ///
    /// Undecodable bytes are [`JobError::MalformedPayload`]; decodable
    /// events that break a field constraint are [`JobError::Validation`].
    /// Both are permanent failures.
    pub fn decode(payload: &[u8]) -> Result<Self, JobError> {
        let event: IngestEvent = serde_json::from_slice(payload)
            .map_err(|e| JobError::MalformedPayload(e.to_string()))?;
        event
            .validate()
            .map_err(|e| JobError::Validation(e.to_string()))?;
        Ok(event)
    }
}

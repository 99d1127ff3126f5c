//! Push delivery envelope.
//!
//! ```json
//! {
//!   "message": {
//!     "data": "aGVsbG8=",
//!     "id": "m1",
//!     "attributes": { "origin": "tracker" },
//!     "publishTime": "2026-01-05T10:00:00Z"
//!   },
//!   "subscription": "projects/p/subscriptions/sub-a",
//!   "deliveryAttempt": 1
//! }
//! ```
//!
//! Brokers commonly send the message id as both `messageId` and
//! `message_id` (and the publish time likewise), so each spelling is read
//! into its own slot and merged afterwards.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ingest_core::types::Timestamp;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PushEnvelope {
    pub message: PushMessage,
    pub subscription: String,
    #[serde(default, rename = "deliveryAttempt")]
    pub delivery_attempt: Option<u32>,
}

impl PushEnvelope {
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawMessage")]
pub struct PushMessage {
    /// Decoded payload. Empty when the broker sent no data.
    pub data: Vec<u8>,
    pub id: String,
    pub attributes: Option<HashMap<String, String>>,
    pub publish_time: Option<Timestamp>,
}

#[derive(Deserialize)]
struct RawMessage {
    #[serde(default, deserialize_with = "base64_bytes")]
    data: Vec<u8>,
    id: Option<String>,
    #[serde(rename = "messageId")]
    message_id_camel: Option<String>,
    #[serde(rename = "message_id")]
    message_id_snake: Option<String>,
    attributes: Option<HashMap<String, String>>,
    #[serde(default, rename = "publishTime", deserialize_with = "lenient_timestamp")]
    publish_time_camel: Option<Timestamp>,
    #[serde(default, rename = "publish_time", deserialize_with = "lenient_timestamp")]
    publish_time_snake: Option<Timestamp>,
}

impl TryFrom<RawMessage> for PushMessage {
    type Error = String;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        let id = raw
            .id
            .or(raw.message_id_camel)
            .or(raw.message_id_snake)
            .ok_or_else(|| "missing field `id`".to_string())?;

        Ok(PushMessage {
            data: raw.data,
            id,
            attributes: raw.attributes,
            publish_time: raw.publish_time_camel.or(raw.publish_time_snake),
        })
    }
}

fn base64_bytes<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(encoded) => STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom),
    }
}

/// Publish time is informational; an unreadable value is dropped rather than
/// failing the envelope.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| s.parse::<Timestamp>().ok()))
}

//! Delivery acknowledgement policy.
//!
//! The push broker reads only the HTTP status:
//!
//! - `2xx` acknowledges the message.
//! - `4xx` marks it failed without redelivery.
//! - `5xx` negatively acknowledges it so it is redelivered later.
//!
//! [`ACK_POLICY`] is the single table from outcome kind to status.

use axum::http::StatusCode;
use ingest_core::error::Retryability;

/// Terminal classification of one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Acknowledged,
    RetryableFailure,
    NonRetryableFailure,
}

impl OutcomeKind {
    pub fn from_retryability(retryability: Retryability) -> Self {
        match retryability {
            Retryability::Retryable => OutcomeKind::RetryableFailure,
            Retryability::NonRetryable => OutcomeKind::NonRetryableFailure,
        }
    }
}

pub const ACK_POLICY: [(OutcomeKind, StatusCode); 3] = [
    (OutcomeKind::Acknowledged, StatusCode::OK),
    (OutcomeKind::NonRetryableFailure, StatusCode::UNPROCESSABLE_ENTITY),
    (OutcomeKind::RetryableFailure, StatusCode::INTERNAL_SERVER_ERROR),
];

/// Look up the response status for `kind` in [`ACK_POLICY`].
pub fn status_for(kind: OutcomeKind) -> StatusCode {
    ACK_POLICY
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, status)| *status)
        // Unreachable while the table is complete; redelivery is the safe default.
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

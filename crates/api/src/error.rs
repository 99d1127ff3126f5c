use axum::http::header::ALLOW;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use ingest_core::error::JobError;
use ingest_core::types::SequenceNumber;
use serde_json::json;

use crate::ack::{self, OutcomeKind};
use crate::dispatcher::Stage;

/// Application-level error type for HTTP handlers.
///
/// Transport errors (wrong method, malformed envelope) are always client
/// errors. Job failures take their status from the ack policy table.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The push route only accepts `POST`.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(Method),

    /// The body is not a well-formed push envelope.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Job construction or execution failed.
    #[error("Job {sequence} failed to {stage}: {source}")]
    Job {
        sequence: SequenceNumber,
        stage: Stage,
        #[source]
        source: JobError,
    },
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::MethodNotAllowed(method) => (
                StatusCode::METHOD_NOT_ALLOWED,
                "METHOD_NOT_ALLOWED",
                format!("{method} is not supported, use POST"),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Job {
                sequence,
                stage,
                source,
            } => {
                let kind = OutcomeKind::from_retryability(source.retryability());
                let message = match kind {
                    OutcomeKind::NonRetryableFailure => {
                        format!("Failed to {stage} job {sequence}: {source}")
                    }
                    _ => format!("Failed to {stage} job {sequence}, retry later"),
                };
                (ack::status_for(kind), source.code(), message)
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        let mut response = (status, axum::Json(body)).into_response();
        if matches!(self, AppError::MethodNotAllowed(_)) {
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("POST"));
        }
        response
    }
}

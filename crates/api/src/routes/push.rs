//! Delivery receiver: the push endpoint the broker calls once per message.
//!
//! Transport checks happen here (method, envelope shape). Payload content is
//! never inspected; that is the job's concern.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::routing::any;
use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::envelope::PushEnvelope;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Longest payload prefix written to the receipt log line.
const PAYLOAD_LOG_LIMIT: usize = 512;

/// `/` -- accepts one push envelope per request.
///
/// `200` with an empty body acknowledges the message. Non-`POST` methods and
/// malformed envelopes are rejected with `4xx` before the dispatcher runs.
pub async fn receive_push(
    State(state): State<AppState>,
    method: Method,
    body: Bytes,
) -> AppResult<StatusCode> {
    if method != Method::POST {
        tracing::warn!(%method, "Rejected push request with unsupported method");
        return Err(AppError::MethodNotAllowed(method));
    }

    let envelope = PushEnvelope::parse(&body).map_err(|e| {
        tracing::warn!(error = %e, body_len = body.len(), "Failed to decode push envelope");
        AppError::BadRequest(format!("Invalid push envelope: {e}"))
    })?;

    let payload = envelope.message.data;
    let preview_len = payload.len().min(PAYLOAD_LOG_LIMIT);
    tracing::info!(
        message_id = %envelope.message.id,
        subscription = %envelope.subscription,
        attributes = envelope.message.attributes.as_ref().map_or(0, |a| a.len()),
        delivery_attempt = envelope.delivery_attempt,
        publish_time = ?envelope.message.publish_time,
        payload_len = payload.len(),
        payload = %String::from_utf8_lossy(&payload[..preview_len]),
        "Received push message",
    );

    // Cancelled when this future is dropped (client abort or request timeout).
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    state.dispatcher.dispatch(payload, cancel).await.into_result()
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", any(receive_push))
}

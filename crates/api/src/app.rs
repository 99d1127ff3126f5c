use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::routes;
use crate::state::AppState;

/// Build the application router with the full middleware stack.
///
/// Shared by `main.rs` and the integration tests so both exercise the same
/// layers. Infrastructure failures (panic, timeout) answer with `5xx` so the
/// broker redelivers; an oversize body answers `413`.
pub fn build_app(state: AppState) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let max_body_bytes = state.config.max_body_bytes;

    Router::new()
        .merge(routes::push::router())
        .merge(routes::health::router())
        // -- Middleware stack (applied bottom-up) --
        .layer(DefaultBodyLimit::max(max_body_bytes))
        // Panic recovery: a panicking handler yields 500.
        .layer(CatchPanicLayer::new())
        // Request timeout. Dropping the handler cancels its job context.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::SERVICE_UNAVAILABLE,
            timeout,
        ))
        // Propagate request ID to response.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        // Structured request/response tracing.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Set request ID on incoming requests.
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .with_state(state)
}

//! Shared helpers for the API integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http_body_util::BodyExt;
use ingest_core::error::JobError;
use ingest_core::types::SequenceNumber;
use ingest_jobs::{ExecutionContext, Job, JobFactory};
use ingest_stores::{DocumentStore, MemoryDocumentStore, MemoryWarehouse, Warehouse};
use serde_json::{json, Value};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use ingest_api::app::build_app;
use ingest_api::config::ServerConfig;
use ingest_api::dispatcher::Dispatcher;
use ingest_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        initial_sequence: 1,
        request_timeout_secs: 30,
        max_body_bytes: 1024 * 1024,
        warehouse_database_url: "postgres://unused/warehouse".to_string(),
        document_database_url: "postgres://unused/documents".to_string(),
    }
}

/// A fully wired application over in-memory stores.
pub struct TestApp {
    pub router: Router,
    pub dispatcher: Arc<Dispatcher>,
    pub warehouse: Arc<MemoryWarehouse>,
    pub documents: Arc<MemoryDocumentStore>,
}

/// Build the full application router, with every middleware layer `main.rs`
/// installs, around the given job factory.
pub fn build_test_app(factory: Arc<dyn JobFactory>, config: ServerConfig) -> TestApp {
    let warehouse = Arc::new(MemoryWarehouse::new());
    let documents = Arc::new(MemoryDocumentStore::new());

    let dispatcher = Arc::new(Dispatcher::new(
        config.initial_sequence,
        factory,
        warehouse.clone(),
        documents.clone(),
    ));

    let state = AppState {
        config: Arc::new(config),
        dispatcher: Arc::clone(&dispatcher),
        warehouse: warehouse.clone(),
        documents: documents.clone(),
    };

    TestApp {
        router: build_app(state),
        dispatcher,
        warehouse,
        documents,
    }
}

// ---------------------------------------------------------------------------
// Scripted job factory
// ---------------------------------------------------------------------------

/// Job factory whose behaviour is selected by the payload text:
///
/// | Payload         | Behaviour                                  |
/// |-----------------|--------------------------------------------|
/// | `create:retry`  | `create` fails, retryable                  |
/// | `create:fatal`  | `create` fails, non-retryable              |
/// | `process:retry` | `process` fails, retryable                 |
/// | `process:fatal` | `process` fails, non-retryable             |
/// | `wait`          | `process` blocks until cancelled           |
/// | anything else   | succeeds                                   |
#[derive(Default)]
pub struct ScriptedFactory {
    pub recorder: Arc<Recorder>,
}

/// What the scripted factory and its jobs observed.
#[derive(Default)]
pub struct Recorder {
    /// `(payload, sequence)` for every `create` call, in call order.
    pub creates: Mutex<Vec<(Vec<u8>, SequenceNumber)>>,
    /// Sequence numbers of every `process` call.
    pub processed: Mutex<Vec<SequenceNumber>>,
    /// Cancellation tokens seen by `wait` jobs.
    pub tokens: Mutex<Vec<CancellationToken>>,
    /// Signalled when a `wait` job starts blocking.
    pub waiting: Notify,
}

impl Recorder {
    pub fn creates(&self) -> Vec<(Vec<u8>, SequenceNumber)> {
        self.creates.lock().unwrap().clone()
    }

    pub fn processed(&self) -> Vec<SequenceNumber> {
        self.processed.lock().unwrap().clone()
    }

    pub fn tokens(&self) -> Vec<CancellationToken> {
        self.tokens.lock().unwrap().clone()
    }
}

impl ScriptedFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl JobFactory for ScriptedFactory {
    async fn create(
        &self,
        payload: Vec<u8>,
        sequence: SequenceNumber,
        _warehouse: Arc<dyn Warehouse>,
        _documents: Arc<dyn DocumentStore>,
    ) -> Result<Box<dyn Job>, JobError> {
        self.recorder
            .creates
            .lock()
            .unwrap()
            .push((payload.clone(), sequence));

        match payload.as_slice() {
            b"create:retry" => Err(JobError::Unavailable("scripted outage".into())),
            b"create:fatal" => Err(JobError::MalformedPayload("scripted bad payload".into())),
            _ => Ok(Box::new(ScriptedJob {
                payload,
                recorder: Arc::clone(&self.recorder),
            })),
        }
    }
}

struct ScriptedJob {
    payload: Vec<u8>,
    recorder: Arc<Recorder>,
}

#[async_trait]
impl Job for ScriptedJob {
    async fn process(&self, ctx: &ExecutionContext) -> Result<(), JobError> {
        self.recorder.processed.lock().unwrap().push(ctx.sequence());

        match self.payload.as_slice() {
            b"process:retry" => Err(JobError::Timeout("scripted timeout".into())),
            b"process:fatal" => Err(JobError::Conflict("scripted conflict".into())),
            b"wait" => {
                self.recorder
                    .tokens
                    .lock()
                    .unwrap()
                    .push(ctx.cancellation().clone());
                self.recorder.waiting.notify_one();
                ctx.run(std::future::pending::<Result<(), JobError>>()).await
            }
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Build a push envelope carrying `data` as its payload.
pub fn envelope(data: &[u8], id: &str, subscription: &str) -> Value {
    json!({
        "message": {
            "data": STANDARD.encode(data),
            "id": id,
        },
        "subscription": subscription,
    })
}

/// Send a request with an arbitrary method and raw body.
pub async fn send(app: Router, method: Method, uri: &str, body: impl Into<Body>) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST a JSON value.
pub async fn post_json(app: Router, uri: &str, value: &Value) -> Response {
    send(app, Method::POST, uri, value.to_string()).await
}

/// Deliver a push envelope for `data` to `/`.
pub async fn push(app: Router, data: &[u8]) -> Response {
    post_json(app, "/", &envelope(data, "m1", "sub-a")).await
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, Body::empty()).await
}

pub async fn body_bytes(response: Response) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}

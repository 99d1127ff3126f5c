use std::sync::Arc;

use ingest_stores::{DocumentStore, Warehouse};

use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (body limit and timeout are read when building the router).
    pub config: Arc<ServerConfig>,
    /// Work dispatcher holding the process-wide sequence counter.
    pub dispatcher: Arc<Dispatcher>,
    /// Analytical warehouse client, probed by the health check.
    pub warehouse: Arc<dyn Warehouse>,
    /// Document store client, probed by the health check.
    pub documents: Arc<dyn DocumentStore>,
}

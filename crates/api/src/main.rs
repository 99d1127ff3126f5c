use std::net::SocketAddr;
use std::sync::Arc;

use ingest_jobs::EventJobFactory;
use ingest_stores::{DocumentStore, PgDocumentStore, PgWarehouse, Warehouse};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ingest_api::app::build_app;
use ingest_api::config::ServerConfig;
use ingest_api::dispatcher::Dispatcher;
use ingest_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    init_tracing();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(
        host = %config.host,
        port = config.port,
        initial_sequence = config.initial_sequence,
        request_timeout_secs = config.request_timeout_secs,
        "Loaded server configuration",
    );

    // --- Warehouse ---
    let warehouse_pool = ingest_stores::create_pool(&config.warehouse_database_url)
        .await
        .expect("Failed to connect to warehouse database");
    ingest_stores::run_warehouse_migrations(&warehouse_pool)
        .await
        .expect("Failed to run warehouse migrations");
    tracing::info!("Warehouse client initialized");

    // --- Document store ---
    let documents_pool = ingest_stores::create_pool(&config.document_database_url)
        .await
        .expect("Failed to connect to document database");
    ingest_stores::run_document_migrations(&documents_pool)
        .await
        .expect("Failed to run document store migrations");
    tracing::info!("Document store client initialized");

    let warehouse: Arc<dyn Warehouse> = Arc::new(PgWarehouse::new(warehouse_pool.clone()));
    let documents: Arc<dyn DocumentStore> = Arc::new(PgDocumentStore::new(documents_pool.clone()));

    // --- Dispatcher ---
    let dispatcher = Arc::new(Dispatcher::new(
        config.initial_sequence,
        Arc::new(EventJobFactory),
        Arc::clone(&warehouse),
        Arc::clone(&documents),
    ));

    // --- App state ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let state = AppState {
        config: Arc::new(config),
        dispatcher,
        warehouse,
        documents,
    };
    let app = build_app(state);

    // --- Start server ---
    tracing::info!(%addr, "Starting push subscription server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    warehouse_pool.close().await;
    documents_pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the default filter; `LOG_FORMAT=json` switches to
/// structured JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ingest_api=debug,ingest_jobs=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

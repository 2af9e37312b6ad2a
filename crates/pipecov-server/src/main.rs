use std::sync::Arc;

use pipecov_db_memory::InMemoryActivityStore;
use pipecov_reconciler::{DispatchConfig, Reconciler, spawn};
use pipecov_report::ReportFetcher;
use pipecov_server::{AppConfig, ServerBuilder};
use pipecov_storage::ActivityEvents;

#[tokio::main]
async fn main() {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist - it's optional
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    // Initialize tracing early with the default level
    pipecov_server::observability::init_tracing();

    let cfg = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    pipecov_server::observability::apply_logging_level(&cfg.log_level);
    tracing::info!(
        namespace = %cfg.namespace,
        http_port = cfg.http_port,
        "Configuration loaded"
    );

    let store = Arc::new(InMemoryActivityStore::new());

    let fetcher = match ReportFetcher::new() {
        Ok(f) => f,
        Err(e) => {
            eprintln!("HTTP client initialization failed: {e}");
            std::process::exit(2);
        }
    };

    let reconciler = Arc::new(Reconciler::new(store.clone(), fetcher));
    let events = store.subscribe();
    let dispatcher = spawn(
        reconciler,
        store.clone(),
        events,
        DispatchConfig::new(cfg.namespace.clone()),
    );
    tracing::info!(namespace = %cfg.namespace, "Reconciler started");

    let server = ServerBuilder::new().with_config(&cfg).build();
    if let Err(err) = server.run().await {
        eprintln!("Server error: {err}");
    }

    dispatcher.shutdown().await;
    tracing::info!("Reconciler stopped");
}

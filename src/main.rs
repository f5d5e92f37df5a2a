use collab_doc::{build_app, config::Config, services::doc_store::DocStore, AppState};
use tracing::{info, error, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use std::panic;

#[tokio::main]
async fn main() {

    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Load configuration before tracing so LOG_LEVEL can drive the filter
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("collab_doc={},tower_http=debug,axum::rejection=trace,info", config.log_level).into()
        }))
        .init();

    info!("Starting {} ({})...", config.service_name, config.environment);
    if let Some(e) = config_error {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
    }

    let store = match DocStore::open(&config.db_url, config.db_max_connections, config.store_timeout()).await {
        Ok(store) => {
            info!("Database initialized successfully");
            store
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let address = config.server_address();
    let default_doc = config.default_doc_id.clone();
    let state = AppState::new(config, store);
    let app = build_app(state.clone());

    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", address, e);
            std::process::exit(1);
        }
    };

    info!("🚀 Server running on http://{}", address);
    info!("📡 Relay available at ws://{}/api/ws (document '{}')", address, default_doc);
    info!("📚 Swagger UI available at http://{}/swagger", address);

    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
        error!("Server error: {}", e);
    }

    state.store.close().await;
    info!("Server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

//! GhostTube Log Server
//!
//! Main entry point for the record store service.

use axum::http::{HeaderValue, Method};
use ghosttube_logserver::{
    record_store::MySqlRecordStore,
    state::{AppConfig, AppState},
    web_api,
};
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build the CORS layer from the configured origin list.
///
/// Credentials are only enabled for an explicit allow-list; the CORS
/// protocol forbids combining them with wildcard origins/methods/headers,
/// and tower-http rejects that combination at startup.
fn build_cors(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let mut list = Vec::new();
    for origin in origins {
        match origin.parse::<HeaderValue>() {
            Ok(value) => list.push(value),
            Err(_) => tracing::warn!(origin = %origin, "Ignoring invalid CORS origin"),
        }
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(list))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ghosttube_logserver=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting GhostTube log server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (DATABASE_URL and DB_NAME are required)
    let config = AppConfig::from_env()?;
    tracing::info!(
        db_name = %config.db_name,
        host = %config.host,
        port = config.port,
        cors_origins = ?config.cors_origins,
        "Configuration loaded"
    );

    // Create database pool
    let pool = MySqlPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.connect_url())
        .await?;

    tracing::info!("Database connected");

    // Initialize record store and bootstrap the schema
    let store = MySqlRecordStore::new(pool.clone(), config.tables.clone());
    store.ensure_schema().await?;

    // Create application state
    let state = AppState {
        config: config.clone(),
        records: Arc::new(store),
    };

    let app = web_api::create_router(state)
        .layer(build_cors(&config.cors_origins))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Release the store connection on the way out
    pool.close().await;
    tracing::info!("Database pool closed");

    Ok(())
}

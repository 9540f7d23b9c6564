//! AR-Rahanu backend server
//!
//! Gold-backed Islamic financing API: client onboarding, collateral
//! valuation, loan lifecycle management and repayment tracking.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use ar_rahanu::config::Config;
use ar_rahanu::state::AppState;
use ar_rahanu::storage::{MemoryStorage, PgStorage, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Starting up");

    // Backend selection: DATABASE_URL means PostgreSQL, otherwise in-memory
    let (storage, db_pool): (Arc<dyn Storage>, Option<PgPool>) = match &config.database_url {
        Some(url) => {
            tracing::info!(
                database = config.database_url_masked().unwrap_or_default(),
                "Connecting to PostgreSQL"
            );
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(url)
                .await
                .context("Failed to connect to database")?;
            (Arc::new(PgStorage::new(pool.clone())), Some(pool))
        }
        None => {
            tracing::info!("No DATABASE_URL set, using in-memory storage");
            (Arc::new(MemoryStorage::new()), None)
        }
    };

    let app_state = AppState::new(storage);

    let health_pool = db_pool.clone();
    let app = ar_rahanu::app(app_state)
        .route("/health", get(move || health_check(health_pool.clone())))
        .layer(configure_cors(&config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind server address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Health check response
#[derive(serde::Serialize)]
struct HealthResponse {
    status: String,
    storage: String,
    version: String,
}

async fn health_check(pool: Option<PgPool>) -> axum::Json<HealthResponse> {
    let storage_status = match &pool {
        Some(pool) => match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => "postgres: connected".to_string(),
            Err(e) => format!("postgres: error: {}", e),
        },
        None => "memory".to_string(),
    };

    let status = if storage_status.contains("error") {
        "unhealthy"
    } else {
        "healthy"
    };

    axum::Json(HealthResponse {
        status: status.to_string(),
        storage: storage_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn configure_cors(config: &Config) -> CorsLayer {
    let Some(allowed) = config.cors_allowed_origins.as_deref() else {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins");
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = allowed
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
}

/// Graceful shutdown on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            tracing::error!("Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(_) => {
                tracing::error!("Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}

//! AR-Rahanu backend library
//!
//! Shariah-compliant gold financing: clients pledge gold collateral,
//! financing is extended under an Islamic contract structure, and repayment
//! runs on a generated installment schedule.

pub mod config;
pub mod contracts;
pub mod error;
pub mod handlers;
pub mod loan_service;
pub mod middleware;
pub mod models;
pub mod payment_service;
pub mod routes;
pub mod state;
pub mod storage;
pub mod valuation;

use axum::{routing::get, Router};

use state::AppState;

/// Assemble the API router over the given state. Transport-level layers
/// (CORS, health) are attached by the binary.
pub fn app(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .merge(routes::user_routes())
        .merge(routes::client_routes())
        .merge(routes::gold_item_routes())
        .merge(routes::loan_routes())
        .merge(routes::payment_routes())
        .merge(routes::document_routes())
        .merge(routes::notification_routes())
        .merge(routes::gold_price_routes())
        .with_state(app_state)
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_tracing))
}

async fn root() -> &'static str {
    "AR-Rahanu API Server"
}

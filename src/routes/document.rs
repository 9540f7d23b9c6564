//! Document route definitions

use axum::Router;

use crate::handlers::*;
use crate::state::AppState;

pub fn document_routes() -> Router<AppState> {
    Router::new()
        .route("/api/documents", axum::routing::get(list_documents))
        .route("/api/documents", axum::routing::post(create_document))
        .route(
            "/api/documents/generate",
            axum::routing::post(generate_contract_document),
        )
        .route("/api/documents/:id", axum::routing::get(get_document))
        .route(
            "/api/documents/:id/download",
            axum::routing::get(download_document),
        )
        .route(
            "/api/documents/:id/status",
            axum::routing::patch(update_document_status),
        )
        .route(
            "/api/contracts/template/:template_type",
            axum::routing::get(download_contract_template),
        )
}

//! Client route definitions

use axum::Router;

use crate::handlers::*;
use crate::state::AppState;

pub fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/api/clients", axum::routing::get(list_clients))
        .route("/api/clients", axum::routing::post(create_client))
        .route("/api/clients/:id", axum::routing::get(get_client))
        .route("/api/clients/:id/loans", axum::routing::get(list_client_loans))
}

//! Gold item route definitions

use axum::Router;

use crate::handlers::*;
use crate::state::AppState;

pub fn gold_item_routes() -> Router<AppState> {
    Router::new()
        .route("/api/gold-items", axum::routing::get(list_gold_items))
        .route("/api/gold-items", axum::routing::post(create_gold_item))
        .route(
            "/api/gold-items/valuation",
            axum::routing::post(compute_gold_valuation),
        )
        .route("/api/gold-items/:id", axum::routing::get(get_gold_item))
}

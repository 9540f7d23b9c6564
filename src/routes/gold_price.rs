//! Gold price route definitions

use axum::Router;

use crate::handlers::*;
use crate::state::AppState;

pub fn gold_price_routes() -> Router<AppState> {
    Router::new()
        .route("/api/gold-price", axum::routing::get(get_gold_price))
        .route("/api/gold-price", axum::routing::post(create_gold_price))
        .route(
            "/api/gold-price/history",
            axum::routing::get(gold_price_history),
        )
}

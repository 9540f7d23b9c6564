//! Loan route definitions

use axum::Router;

use crate::handlers::*;
use crate::state::AppState;

pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/api/loans", axum::routing::get(list_loans))
        .route("/api/loans", axum::routing::post(create_loan))
        .route("/api/loans/:id", axum::routing::get(get_loan))
        .route("/api/loans/:id", axum::routing::patch(update_loan))
        .route(
            "/api/loans/:id/status",
            axum::routing::patch(update_loan_status),
        )
        .route(
            "/api/loans/:id/activate",
            axum::routing::post(activate_loan),
        )
        .route(
            "/api/loans/:id/payments",
            axum::routing::get(list_loan_payments),
        )
        .route(
            "/api/loans/:id/documents",
            axum::routing::get(list_loan_documents),
        )
}

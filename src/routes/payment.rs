//! Payment route definitions

use axum::Router;

use crate::handlers::*;
use crate::state::AppState;

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/api/payments", axum::routing::post(create_payment))
        .route(
            "/api/payments/upcoming",
            axum::routing::get(list_upcoming_payments),
        )
        .route(
            "/api/payments/overdue",
            axum::routing::get(list_overdue_payments),
        )
        .route(
            "/api/payments/reminders",
            axum::routing::post(dispatch_payment_reminders),
        )
        .route("/api/payments/:id", axum::routing::get(get_payment))
        .route(
            "/api/payments/:id/status",
            axum::routing::patch(update_payment_status),
        )
}

//! Notification route definitions

use axum::Router;

use crate::handlers::*;
use crate::state::AppState;

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/notifications",
            axum::routing::post(create_notification),
        )
        .route(
            "/api/notifications/:id/read",
            axum::routing::patch(mark_notification_read),
        )
}

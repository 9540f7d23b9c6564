//! User route definitions

use axum::Router;

use crate::handlers::*;
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", axum::routing::post(create_user))
        .route("/api/users/:id", axum::routing::get(get_user))
        .route(
            "/api/users/:id/notifications",
            axum::routing::get(list_user_notifications),
        )
        .route(
            "/api/users/:id/notifications/unread",
            axum::routing::get(list_unread_user_notifications),
        )
}

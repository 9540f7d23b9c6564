use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use crate::error::ApiResult;
use crate::models::{ApiResponse, CreateNotificationRequest, Notification};
use crate::storage::{NewNotification, Storage};

pub async fn create_notification(
    State(storage): State<Arc<dyn Storage>>,
    Json(request): Json<CreateNotificationRequest>,
) -> ApiResult<Json<ApiResponse<Notification>>> {
    request.validate()?;
    storage.get_user(request.user_id).await?;

    let notification = storage
        .create_notification(NewNotification {
            user_id: request.user_id,
            title: request.title,
            message: request.message,
            kind: request.kind,
        })
        .await?;

    Ok(Json(ApiResponse::ok(notification)))
}

pub async fn list_user_notifications(
    State(storage): State<Arc<dyn Storage>>,
    Path(user_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Vec<Notification>>>> {
    storage.get_user(user_id).await?;
    let notifications = storage.list_notifications_by_user(user_id).await?;
    Ok(Json(ApiResponse::ok(notifications)))
}

pub async fn list_unread_user_notifications(
    State(storage): State<Arc<dyn Storage>>,
    Path(user_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Vec<Notification>>>> {
    storage.get_user(user_id).await?;
    let notifications = storage.list_unread_notifications_by_user(user_id).await?;
    Ok(Json(ApiResponse::ok(notifications)))
}

pub async fn mark_notification_read(
    State(storage): State<Arc<dyn Storage>>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Notification>>> {
    let notification = storage.mark_notification_read(id).await?;
    Ok(Json(ApiResponse::ok(notification)))
}

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::models::{ApiResponse, CreateUserRequest, UserResponse};
use crate::storage::{NewUser, Storage};

pub async fn create_user(
    State(storage): State<Arc<dyn Storage>>,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    request.validate()?;

    if storage
        .get_user_by_username(&request.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "Username {} is already taken",
            request.username
        )));
    }

    let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)?;
    let user = storage
        .create_user(NewUser {
            username: request.username,
            password_hash,
            full_name: request.full_name,
            email: request.email,
            phone: request.phone,
            role: request.role,
        })
        .await?;

    Ok(Json(ApiResponse::ok(user.into())))
}

pub async fn get_user(
    State(storage): State<Arc<dyn Storage>>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let user = storage.get_user(id).await?;
    Ok(Json(ApiResponse::ok(user.into())))
}

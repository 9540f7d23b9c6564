use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use validator::Validate;

use crate::error::ApiResult;
use crate::models::{
    ApiResponse, CreatePaymentRequest, DaysQuery, Payment, UpdatePaymentStatusRequest,
};
use crate::payment_service::PaymentService;

pub async fn create_payment(
    State(service): State<Arc<PaymentService>>,
    Json(request): Json<CreatePaymentRequest>,
) -> ApiResult<Json<ApiResponse<Payment>>> {
    request.validate()?;
    let payment = service.create_payment(request).await?;
    Ok(Json(ApiResponse::ok(payment)))
}

pub async fn get_payment(
    State(service): State<Arc<PaymentService>>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Payment>>> {
    let payment = service.get_payment(id).await?;
    Ok(Json(ApiResponse::ok(payment)))
}

pub async fn update_payment_status(
    State(service): State<Arc<PaymentService>>,
    Path(id): Path<i32>,
    Json(request): Json<UpdatePaymentStatusRequest>,
) -> ApiResult<Json<ApiResponse<Payment>>> {
    let payment = service.update_payment_status(id, request).await?;
    Ok(Json(ApiResponse::ok(payment)))
}

pub async fn list_loan_payments(
    State(service): State<Arc<PaymentService>>,
    Path(loan_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Vec<Payment>>>> {
    let payments = service.list_by_loan(loan_id).await?;
    Ok(Json(ApiResponse::ok(payments)))
}

pub async fn list_upcoming_payments(
    State(service): State<Arc<PaymentService>>,
    Query(query): Query<DaysQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Payment>>>> {
    let payments = service.list_upcoming(query.days).await?;
    Ok(Json(ApiResponse::ok(payments)))
}

pub async fn list_overdue_payments(
    State(service): State<Arc<PaymentService>>,
) -> ApiResult<Json<ApiResponse<Vec<Payment>>>> {
    let payments = service.list_overdue().await?;
    Ok(Json(ApiResponse::ok(payments)))
}

#[derive(Serialize)]
pub struct ReminderSummary {
    pub reminders_sent: usize,
}

pub async fn dispatch_payment_reminders(
    State(service): State<Arc<PaymentService>>,
) -> ApiResult<Json<ApiResponse<ReminderSummary>>> {
    let reminders_sent = service.dispatch_payment_reminders().await?;
    Ok(Json(ApiResponse::ok(ReminderSummary { reminders_sent })))
}

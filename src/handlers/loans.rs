use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use validator::Validate;

use crate::error::ApiResult;
use crate::loan_service::LoanService;
use crate::models::{
    ActivateLoanRequest, ApiResponse, CreateLoanRequest, ListLoansQuery, Loan,
    UpdateLoanRequest, UpdateLoanStatusRequest,
};
use crate::storage::Storage;

pub async fn create_loan(
    State(service): State<Arc<LoanService>>,
    Json(request): Json<CreateLoanRequest>,
) -> ApiResult<Json<ApiResponse<Loan>>> {
    request.validate()?;
    let loan = service.create_loan(request).await?;
    Ok(Json(ApiResponse::ok(loan)))
}

pub async fn get_loan(
    State(storage): State<Arc<dyn Storage>>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Loan>>> {
    let loan = storage.get_loan(id).await?;
    Ok(Json(ApiResponse::ok(loan)))
}

pub async fn list_loans(
    State(storage): State<Arc<dyn Storage>>,
    Query(query): Query<ListLoansQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Loan>>>> {
    let loans = storage.list_loans(query.status).await?;
    Ok(Json(ApiResponse::ok(loans)))
}

pub async fn update_loan(
    State(service): State<Arc<LoanService>>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateLoanRequest>,
) -> ApiResult<Json<ApiResponse<Loan>>> {
    let loan = service.update_loan(id, request).await?;
    Ok(Json(ApiResponse::ok(loan)))
}

pub async fn update_loan_status(
    State(service): State<Arc<LoanService>>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateLoanStatusRequest>,
) -> ApiResult<Json<ApiResponse<Loan>>> {
    let loan = service.update_loan_status(id, request.status).await?;
    Ok(Json(ApiResponse::ok(loan)))
}

pub async fn activate_loan(
    State(service): State<Arc<LoanService>>,
    Path(id): Path<i32>,
    Json(request): Json<ActivateLoanRequest>,
) -> ApiResult<Json<ApiResponse<Loan>>> {
    let loan = service.activate_loan(id, request.start_date).await?;
    Ok(Json(ApiResponse::ok(loan)))
}

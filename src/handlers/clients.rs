use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::models::{ApiResponse, Client, CreateClientRequest, Loan};
use crate::storage::{NewClient, Storage};

pub async fn create_client(
    State(storage): State<Arc<dyn Storage>>,
    Json(request): Json<CreateClientRequest>,
) -> ApiResult<Json<ApiResponse<Client>>> {
    request.validate()?;

    if !request.regulatory_consent {
        return Err(ApiError::Validation(
            "Regulatory consent is required before onboarding a client".to_string(),
        ));
    }

    let client = storage
        .create_client(NewClient {
            full_name: request.full_name,
            email: request.email,
            phone: request.phone,
            address: request.address,
            identification_number: request.identification_number,
            identification_type: request.identification_type,
            nationality: request.nationality,
            state_of_residence: request.state_of_residence,
            religion: request.religion,
            race: request.race,
            regulatory_consent: request.regulatory_consent,
        })
        .await?;

    Ok(Json(ApiResponse::ok(client)))
}

pub async fn get_client(
    State(storage): State<Arc<dyn Storage>>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Client>>> {
    let client = storage.get_client(id).await?;
    Ok(Json(ApiResponse::ok(client)))
}

pub async fn list_clients(
    State(storage): State<Arc<dyn Storage>>,
) -> ApiResult<Json<ApiResponse<Vec<Client>>>> {
    let clients = storage.list_clients().await?;
    Ok(Json(ApiResponse::ok(clients)))
}

pub async fn list_client_loans(
    State(storage): State<Arc<dyn Storage>>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Vec<Loan>>>> {
    storage.get_client(id).await?;
    let loans = storage.list_loans_by_client(id).await?;
    Ok(Json(ApiResponse::ok(loans)))
}

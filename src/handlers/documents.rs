use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::contracts::{contract_document_name, generate_contract};
use crate::error::ApiResult;
use crate::models::{
    ApiResponse, CreateDocumentRequest, Document, DocumentStatus, GenerateDocumentRequest,
    UpdateDocumentStatusRequest,
};
use crate::storage::{NewDocument, Storage};

pub async fn create_document(
    State(storage): State<Arc<dyn Storage>>,
    Json(request): Json<CreateDocumentRequest>,
) -> ApiResult<Json<ApiResponse<Document>>> {
    request.validate()?;
    storage.get_loan(request.loan_id).await?;

    let document = storage
        .create_document(NewDocument {
            loan_id: request.loan_id,
            name: request.name,
            doc_type: request.doc_type,
            status: DocumentStatus::Pending,
            document_number: request.document_number,
            issuing_authority: request.issuing_authority,
            expiry_date: request.expiry_date,
        })
        .await?;

    Ok(Json(ApiResponse::ok(document)))
}

pub async fn get_document(
    State(storage): State<Arc<dyn Storage>>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Document>>> {
    let document = storage.get_document(id).await?;
    Ok(Json(ApiResponse::ok(document)))
}

pub async fn list_documents(
    State(storage): State<Arc<dyn Storage>>,
) -> ApiResult<Json<ApiResponse<Vec<Document>>>> {
    let documents = storage.list_documents().await?;
    Ok(Json(ApiResponse::ok(documents)))
}

pub async fn list_loan_documents(
    State(storage): State<Arc<dyn Storage>>,
    Path(loan_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Vec<Document>>>> {
    storage.get_loan(loan_id).await?;
    let documents = storage.list_documents_by_loan(loan_id).await?;
    Ok(Json(ApiResponse::ok(documents)))
}

pub async fn update_document_status(
    State(storage): State<Arc<dyn Storage>>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateDocumentStatusRequest>,
) -> ApiResult<Json<ApiResponse<Document>>> {
    let document = storage.set_document_status(id, request.status).await?;
    Ok(Json(ApiResponse::ok(document)))
}

#[derive(Serialize)]
pub struct GeneratedContract {
    pub document: Document,
    pub content: String,
}

/// Render a contract for a loan and register it as a pending document.
/// The requested template names and fills the document; it may differ
/// from the loan's own contract structure.
pub async fn generate_contract_document(
    State(storage): State<Arc<dyn Storage>>,
    Json(request): Json<GenerateDocumentRequest>,
) -> ApiResult<Json<ApiResponse<GeneratedContract>>> {
    let loan = storage.get_loan(request.loan_id).await?;
    let client = storage.get_client(loan.client_id).await?;

    let content = generate_contract(&request.template_type, Some(&loan), Some(&client));
    let document = storage
        .create_document(NewDocument {
            loan_id: loan.id,
            name: contract_document_name(&request.template_type, &loan.contract_number),
            doc_type: "contract".to_string(),
            status: DocumentStatus::Pending,
            document_number: Some(loan.contract_number.clone()),
            issuing_authority: None,
            expiry_date: None,
        })
        .await?;

    Ok(Json(ApiResponse::ok(GeneratedContract { document, content })))
}

/// Download a document rendered as HTML, using its type as the template.
pub async fn download_document(
    State(storage): State<Arc<dyn Storage>>,
    Path(id): Path<i32>,
) -> ApiResult<Response> {
    let document = storage.get_document(id).await?;
    let loan = storage.get_loan(document.loan_id).await?;
    let client = storage.get_client(loan.client_id).await?;

    let content = generate_contract(&document.doc_type, Some(&loan), Some(&client));
    Ok(html_attachment(&document.name, content))
}

#[derive(Debug, Deserialize, Default)]
pub struct TemplateQuery {
    pub loan_id: Option<i32>,
}

/// Download a contract template, filled in when a loan id is supplied and
/// rendered with blanks otherwise.
pub async fn download_contract_template(
    State(storage): State<Arc<dyn Storage>>,
    Path(template_type): Path<String>,
    Query(query): Query<TemplateQuery>,
) -> ApiResult<Response> {
    let (loan, client) = match query.loan_id {
        Some(loan_id) => {
            let loan = storage.get_loan(loan_id).await?;
            let client = storage.get_client(loan.client_id).await?;
            (Some(loan), Some(client))
        }
        None => (None, None),
    };

    let content = generate_contract(&template_type, loan.as_ref(), client.as_ref());
    let filename = format!("{}_contract.html", template_type);
    Ok(html_attachment(&filename, content))
}

fn html_attachment(filename: &str, content: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        content,
    )
        .into_response()
}

//! HTTP surface tests over the in-memory backend

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use ar_rahanu::models::{PaymentFrequency, ShariahContract, UserRole};
use ar_rahanu::state::AppState;
use ar_rahanu::storage::{MemoryStorage, NewClient, NewGoldItem, NewLoan, NewUser, Storage};
use rust_decimal_macros::dec;

fn test_app() -> axum::Router {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    ar_rahanu::app(AppState::new(storage))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_create_and_fetch_client() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/clients",
            json!({
                "full_name": "Aminah binti Hassan",
                "email": "aminah@example.com",
                "phone": "+60123456789",
                "identification_number": "900101-14-5678",
                "identification_type": "mykad",
                "regulatory_consent": true
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["id"], json!(1));
    // Nationality defaults when omitted
    assert_eq!(body["data"]["nationality"], json!("Malaysian"));

    let response = app
        .oneshot(Request::builder().uri("/api/clients/1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["full_name"], json!("Aminah binti Hassan"));
}

#[tokio::test]
async fn test_client_without_consent_is_rejected() {
    let app = test_app();
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/clients",
            json!({
                "full_name": "No Consent",
                "email": "nc@example.com",
                "phone": "+60123456780",
                "identification_number": "900101-14-0000",
                "identification_type": "mykad"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn test_missing_loan_is_404() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/api/loans/99").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn test_invalid_transition_maps_to_422() {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let state = AppState::new(storage.clone());
    let app = ar_rahanu::app(state);

    // Seed the referenced entities, then a loan, over HTTP
    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/users",
            json!({
                "username": "officer",
                "password": "correct-horse",
                "full_name": "Officer One",
                "email": "officer@example.com",
                "role": "loan_officer"
            }),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/clients",
            json!({
                "full_name": "Aminah binti Hassan",
                "email": "aminah@example.com",
                "phone": "+60123456789",
                "identification_number": "900101-14-5678",
                "identification_type": "mykad",
                "regulatory_consent": true
            }),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/gold-items",
            json!({
                "item_type": "bangle",
                "weight_grams": "100",
                "purity": 22,
                "estimated_value": "26197.36"
            }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/loans",
            json!({
                "client_id": 1,
                "contract_number": "ARN-2025-0001",
                "gold_item_ids": [1],
                "total_gold_value": "26197.36",
                "financing_amount": "18338.15",
                "financing_ratio": "0.70",
                "profit_rate": "4.5",
                "term_months": 12,
                "payment_frequency": "monthly",
                "shariah_contract": "murabaha",
                "created_by": 1
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request(
            "PATCH",
            "/api/loans/1/status",
            json!({ "status": "active" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], json!("INVALID_TRANSITION"));
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let app = test_app();
    let user = json!({
        "username": "officer",
        "password": "correct-horse",
        "full_name": "Officer One",
        "email": "officer@example.com",
        "role": "loan_officer"
    });

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/users", user.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    // Password hash never leaves the API
    assert!(body["data"].get("password_hash").is_none());

    let response = app
        .oneshot(json_request("POST", "/api/users", user))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], json!("CONFLICT"));
}

async fn app_with_loan() -> axum::Router {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    storage
        .create_user(NewUser {
            username: "officer".to_string(),
            password_hash: "x".to_string(),
            full_name: "Officer One".to_string(),
            email: "officer@example.com".to_string(),
            phone: None,
            role: UserRole::LoanOfficer,
        })
        .await
        .unwrap();
    storage
        .create_client(NewClient {
            full_name: "Aminah binti Hassan".to_string(),
            email: "aminah@example.com".to_string(),
            phone: "+60123456789".to_string(),
            address: None,
            identification_number: "900101-14-5678".to_string(),
            identification_type: "mykad".to_string(),
            nationality: "Malaysian".to_string(),
            state_of_residence: None,
            religion: None,
            race: None,
            regulatory_consent: true,
        })
        .await
        .unwrap();
    storage
        .create_gold_item(NewGoldItem {
            item_type: "bangle".to_string(),
            weight_grams: dec!(50),
            purity: 22,
            description: None,
            estimated_value: dec!(10000),
        })
        .await
        .unwrap();
    storage
        .create_loan(NewLoan {
            client_id: 1,
            contract_number: "ARN-2025-0001".to_string(),
            gold_item_ids: vec![1],
            total_gold_value: dec!(10000),
            financing_amount: dec!(6500),
            financing_ratio: dec!(0.65),
            profit_rate: dec!(4.5),
            term_months: 12,
            payment_frequency: PaymentFrequency::Monthly,
            shariah_contract: ShariahContract::Murabaha,
            created_by: 1,
            assigned_to: None,
        })
        .await
        .unwrap();
    ar_rahanu::app(AppState::new(storage))
}

#[tokio::test]
async fn test_generated_document_named_from_requested_template() {
    let app = app_with_loan().await;

    // A wadiah render of a murabaha-structured loan
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/documents/generate",
            json!({ "loan_id": 1, "template_type": "wadiah" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["document"]["name"], json!("wadiah-ARN-2025-0001.html"));
    let content = body["data"]["content"].as_str().unwrap();
    assert!(content.contains("Wadiah Safekeeping Agreement"));
}

#[tokio::test]
async fn test_document_download_renders_html() {
    let app = app_with_loan().await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/documents",
            json!({
                "loan_id": 1,
                "name": "financing-agreement",
                "doc_type": "murabaha"
            }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/documents/1/download")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .contains("financing-agreement"));
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("ARN-2025-0001"));
    assert!(html.contains("Murabaha"));

    // Missing document id
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/documents/99/download")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_contract_template_download() {
    let app = app_with_loan().await;

    // Blank template, no loan supplied
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/contracts/template/murabaha")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Murabaha Gold Financing Agreement"));
    assert!(html.contains("____________"));

    // Filled in from an existing loan
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/contracts/template/murabaha?loan_id=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("ARN-2025-0001"));
    assert!(html.contains("Aminah binti Hassan"));
}

#[tokio::test]
async fn test_gold_price_seeds_default_quote() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/gold-price").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["price_per_oz"], json!("8889.25"));

    let response = app
        .oneshot(Request::builder()
            .uri("/api/gold-price/history?days=30")
            .body(Body::empty())
            .unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_valuation_endpoint_uses_default_price() {
    let app = test_app();
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/gold-items/valuation",
            json!({
                "weight_grams": "100",
                "purity": 24,
                "financing_ratio": "0.65"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    // 100g * 0.03215 * 8889.25
    let gold_value: rust_decimal::Decimal =
        body["data"]["gold_value"].as_str().unwrap().parse().unwrap();
    assert_eq!(gold_value, rust_decimal_macros::dec!(28578.93875));
}

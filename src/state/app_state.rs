//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::loan_service::LoanService;
use crate::payment_service::PaymentService;
use crate::storage::Storage;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub loan_service: Arc<LoanService>,
    pub payment_service: Arc<PaymentService>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            loan_service: Arc::new(LoanService::new(storage.clone())),
            payment_service: Arc::new(PaymentService::new(storage.clone())),
            storage,
        }
    }
}

impl FromRef<AppState> for Arc<dyn Storage> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for Arc<LoanService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.loan_service.clone()
    }
}

impl FromRef<AppState> for Arc<PaymentService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.payment_service.clone()
    }
}

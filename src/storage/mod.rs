//! Storage abstraction for the AR-Rahanu backend
//!
//! One trait, two backends: an in-memory store for tests and single-process
//! deployments, and a PostgreSQL store for everything else. Both expose the
//! identical contract; the backend is selected once at startup.
//!
//! Lookups for a missing id fail `NotFound`; an empty list is never used to
//! paper over a missing entity. Creates assign the identity and the
//! server-controlled timestamps; callers cannot set them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::ApiResult;
use crate::models::{
    Client, Document, DocumentStatus, GoldItem, GoldPriceQuote, Loan, LoanStatus, Notification,
    Payment, PaymentFrequency, PaymentStatus, ShariahContract, User, UserRole,
};

mod memory;
mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

/// Fields for a new user; the password is already hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
}

#[derive(Debug, Clone)]
pub struct NewClient {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub identification_number: String,
    pub identification_type: String,
    pub nationality: String,
    pub state_of_residence: Option<String>,
    pub religion: Option<String>,
    pub race: Option<String>,
    pub regulatory_consent: bool,
}

#[derive(Debug, Clone)]
pub struct NewGoldItem {
    pub item_type: String,
    pub weight_grams: Decimal,
    pub purity: i32,
    pub description: Option<String>,
    pub estimated_value: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewLoan {
    pub client_id: i32,
    pub contract_number: String,
    pub gold_item_ids: Vec<i32>,
    pub total_gold_value: Decimal,
    pub financing_amount: Decimal,
    pub financing_ratio: Decimal,
    pub profit_rate: Decimal,
    pub term_months: i32,
    pub payment_frequency: PaymentFrequency,
    pub shariah_contract: ShariahContract,
    pub created_by: i32,
    pub assigned_to: Option<i32>,
}

/// Partial loan update; `None` fields are left as stored.
#[derive(Debug, Clone, Default)]
pub struct LoanPatch {
    pub total_gold_value: Option<Decimal>,
    pub financing_amount: Option<Decimal>,
    pub financing_ratio: Option<Decimal>,
    pub profit_rate: Option<Decimal>,
    pub assigned_to: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub loan_id: i32,
    pub amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub payment_method: Option<String>,
    pub reference_number: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub loan_id: i32,
    pub name: String,
    pub doc_type: String,
    pub status: DocumentStatus,
    pub document_number: Option<String>,
    pub issuing_authority: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: i32,
    pub title: String,
    pub message: String,
    pub kind: String,
}

#[derive(Debug, Clone)]
pub struct NewGoldPrice {
    pub price_per_oz: Decimal,
    pub quoted_at: DateTime<Utc>,
}

/// Repository contract shared by the in-memory and PostgreSQL backends.
#[async_trait]
pub trait Storage: Send + Sync {
    // User operations
    async fn get_user(&self, id: i32) -> ApiResult<User>;
    async fn get_user_by_username(&self, username: &str) -> ApiResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> ApiResult<User>;

    // Client operations
    async fn get_client(&self, id: i32) -> ApiResult<Client>;
    async fn list_clients(&self) -> ApiResult<Vec<Client>>;
    async fn create_client(&self, client: NewClient) -> ApiResult<Client>;

    // Gold item operations
    async fn get_gold_item(&self, id: i32) -> ApiResult<GoldItem>;
    async fn list_gold_items(&self) -> ApiResult<Vec<GoldItem>>;
    /// Fetch several items preserving the requested order; fails `NotFound`
    /// naming the first missing id.
    async fn get_gold_items_by_ids(&self, ids: &[i32]) -> ApiResult<Vec<GoldItem>>;
    async fn create_gold_item(&self, item: NewGoldItem) -> ApiResult<GoldItem>;

    // Loan operations
    async fn get_loan(&self, id: i32) -> ApiResult<Loan>;
    async fn get_loan_by_contract_number(&self, contract_number: &str)
        -> ApiResult<Option<Loan>>;
    async fn list_loans(&self, status: Option<LoanStatus>) -> ApiResult<Vec<Loan>>;
    async fn list_loans_by_client(&self, client_id: i32) -> ApiResult<Vec<Loan>>;
    async fn create_loan(&self, loan: NewLoan) -> ApiResult<Loan>;
    async fn update_loan(&self, id: i32, patch: LoanPatch) -> ApiResult<Loan>;
    /// Raw status write; transition legality is the lifecycle service's job.
    async fn set_loan_status(&self, id: i32, status: LoanStatus) -> ApiResult<Loan>;

    // Payment operations
    async fn get_payment(&self, id: i32) -> ApiResult<Payment>;
    async fn list_payments_by_loan(&self, loan_id: i32) -> ApiResult<Vec<Payment>>;
    /// Pending payments due in `[now, now + within_days]`, ascending by due
    /// date. A zero-day window returns only payments due today.
    async fn list_upcoming_payments(&self, within_days: i64) -> ApiResult<Vec<Payment>>;
    /// Pending payments past their due date, ascending by due date.
    async fn list_overdue_payments(&self) -> ApiResult<Vec<Payment>>;
    async fn create_payment(&self, payment: NewPayment) -> ApiResult<Payment>;
    /// Setting `paid` stamps the paid date (defaulting to now); setting
    /// `pending` clears it.
    async fn set_payment_status(
        &self,
        id: i32,
        status: PaymentStatus,
        paid_date: Option<DateTime<Utc>>,
    ) -> ApiResult<Payment>;

    // Document operations
    async fn get_document(&self, id: i32) -> ApiResult<Document>;
    async fn list_documents(&self) -> ApiResult<Vec<Document>>;
    async fn list_documents_by_loan(&self, loan_id: i32) -> ApiResult<Vec<Document>>;
    async fn create_document(&self, document: NewDocument) -> ApiResult<Document>;
    async fn set_document_status(&self, id: i32, status: DocumentStatus) -> ApiResult<Document>;

    // Notification operations
    async fn get_notification(&self, id: i32) -> ApiResult<Notification>;
    async fn list_notifications_by_user(&self, user_id: i32) -> ApiResult<Vec<Notification>>;
    async fn list_unread_notifications_by_user(
        &self,
        user_id: i32,
    ) -> ApiResult<Vec<Notification>>;
    async fn create_notification(&self, notification: NewNotification) -> ApiResult<Notification>;
    async fn mark_notification_read(&self, id: i32) -> ApiResult<Notification>;

    // Gold price operations
    /// Most recent quote by `quoted_at`, if any.
    async fn latest_gold_price(&self) -> ApiResult<Option<GoldPriceQuote>>;
    async fn gold_price_history(&self, days: i64) -> ApiResult<Vec<GoldPriceQuote>>;
    async fn create_gold_price(&self, price: NewGoldPrice) -> ApiResult<GoldPriceQuote>;
}

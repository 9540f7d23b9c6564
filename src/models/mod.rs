//! Data models for the AR-Rahanu backend

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// User model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// User response with the password hash stripped
#[derive(Debug, Serialize, Clone)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// User roles
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    LoanOfficer,
    Customer,
}

/// Client (financing applicant) model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Client {
    pub id: i32,
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
    /// Bank Negara Malaysia data-sharing consent
    pub regulatory_consent: bool,
    pub created_at: DateTime<Utc>,
}

/// Gold collateral item. Immutable once created; re-valuation happens at the
/// loan level, never by mutating the item.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct GoldItem {
    pub id: i32,
    pub item_type: String,
    pub weight_grams: Decimal,
    /// Karat denomination: 24, 22, 18 or 14
    pub purity: i32,
    pub description: Option<String>,
    pub estimated_value: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Loan status lifecycle
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "loan_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Verification,
    Documentation,
    Approved,
    Active,
    Completed,
    Rejected,
}

impl LoanStatus {
    /// Whether the status machine permits moving from `self` to `target`.
    ///
    /// pending -> verification -> {approved, documentation, rejected};
    /// documentation -> {approved, rejected}; approved -> active;
    /// active -> completed. Completed and rejected are terminal.
    pub fn can_transition_to(self, target: LoanStatus) -> bool {
        use LoanStatus::*;
        matches!(
            (self, target),
            (Pending, Verification)
                | (Verification, Approved)
                | (Verification, Documentation)
                | (Verification, Rejected)
                | (Documentation, Approved)
                | (Documentation, Rejected)
                | (Approved, Active)
                | (Active, Completed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LoanStatus::Completed | LoanStatus::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Verification => "verification",
            LoanStatus::Documentation => "documentation",
            LoanStatus::Approved => "approved",
            LoanStatus::Active => "active",
            LoanStatus::Completed => "completed",
            LoanStatus::Rejected => "rejected",
        }
    }
}

/// Installment frequency of the repayment schedule
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "payment_frequency", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentFrequency {
    Monthly,
    Quarterly,
    Biannually,
    Annually,
}

impl PaymentFrequency {
    /// Months between two consecutive installments.
    pub fn interval_months(self) -> u32 {
        match self {
            PaymentFrequency::Monthly => 1,
            PaymentFrequency::Quarterly => 3,
            PaymentFrequency::Biannually => 6,
            PaymentFrequency::Annually => 12,
        }
    }
}

/// Shariah contract structure backing the financing
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "shariah_contract", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShariahContract {
    Murabaha,
    QardHassan,
    Musharakah,
    Wadiah,
}

impl ShariahContract {
    pub fn as_str(self) -> &'static str {
        match self {
            ShariahContract::Murabaha => "murabaha",
            ShariahContract::QardHassan => "qard_hassan",
            ShariahContract::Musharakah => "musharakah",
            ShariahContract::Wadiah => "wadiah",
        }
    }
}

/// Loan model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Loan {
    pub id: i32,
    pub client_id: i32,
    pub contract_number: String,
    /// Ordered foreign keys into gold_items
    pub gold_item_ids: Vec<i32>,
    pub total_gold_value: Decimal,
    pub financing_amount: Decimal,
    pub financing_ratio: Decimal,
    pub status: LoanStatus,
    /// Annual Islamic profit rate in percent (not interest)
    pub profit_rate: Decimal,
    pub term_months: i32,
    pub payment_frequency: PaymentFrequency,
    pub shariah_contract: ShariahContract,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: i32,
    pub assigned_to: Option<i32>,
}

/// Payment status. `Overdue` is derived at read time from
/// `pending && due_date < now`; the service never persists it.
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Overdue,
}

/// Scheduled installment on a loan
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Payment {
    pub id: i32,
    pub loan_id: i32,
    pub amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub paid_date: Option<DateTime<Utc>>,
    pub status: PaymentStatus,
    pub payment_method: Option<String>,
    pub reference_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Status as seen by callers: a pending installment past its due date
    /// reads as overdue without being rewritten in the store.
    pub fn effective_status(&self, now: DateTime<Utc>) -> PaymentStatus {
        if self.status == PaymentStatus::Pending && self.due_date < now {
            PaymentStatus::Overdue
        } else {
            self.status
        }
    }
}

/// Document status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "document_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Approved,
    Rejected,
}

/// Paperwork attached to a loan
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Document {
    pub id: i32,
    pub loan_id: i32,
    pub name: String,
    /// contract, identification, gold_appraisal, ...
    pub doc_type: String,
    pub status: DocumentStatus,
    pub document_number: Option<String>,
    pub issuing_authority: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Notification status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "notification_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Unread,
    Read,
}

/// Per-user notification
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Notification {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub message: String,
    /// system, payment, contract, ...
    pub kind: String,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
}

/// One point in the gold market price series (MYR per troy ounce)
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct GoldPriceQuote {
    pub id: i32,
    pub price_per_oz: Decimal,
    pub quoted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Request payloads
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 1))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClientRequest {
    #[validate(length(min = 1))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub phone: String,
    pub address: Option<String>,
    #[validate(length(min = 1))]
    pub identification_number: String,
    #[validate(length(min = 1))]
    pub identification_type: String,
    #[serde(default = "default_nationality")]
    pub nationality: String,
    pub state_of_residence: Option<String>,
    pub religion: Option<String>,
    pub race: Option<String>,
    #[serde(default)]
    pub regulatory_consent: bool,
}

fn default_nationality() -> String {
    "Malaysian".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGoldItemRequest {
    #[validate(length(min = 1))]
    pub item_type: String,
    pub weight_grams: Decimal,
    pub purity: i32,
    pub description: Option<String>,
    pub estimated_value: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLoanRequest {
    pub client_id: i32,
    #[validate(length(min = 1))]
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

/// Partial loan update; absent fields are left untouched
#[derive(Debug, Deserialize, Default)]
pub struct UpdateLoanRequest {
    pub total_gold_value: Option<Decimal>,
    pub financing_amount: Option<Decimal>,
    pub financing_ratio: Option<Decimal>,
    pub profit_rate: Option<Decimal>,
    pub assigned_to: Option<i32>,
}

impl UpdateLoanRequest {
    /// True when the update touches any field of the financing invariant.
    pub fn touches_financing(&self) -> bool {
        self.total_gold_value.is_some()
            || self.financing_amount.is_some()
            || self.financing_ratio.is_some()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateLoanStatusRequest {
    pub status: LoanStatus,
}

#[derive(Debug, Deserialize, Default)]
pub struct ActivateLoanRequest {
    pub start_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    pub loan_id: i32,
    pub amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub payment_method: Option<String>,
    pub reference_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentStatusRequest {
    pub status: PaymentStatus,
    pub paid_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDocumentRequest {
    pub loan_id: i32,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub doc_type: String,
    pub document_number: Option<String>,
    pub issuing_authority: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDocumentStatusRequest {
    pub status: DocumentStatus,
}

#[derive(Debug, Deserialize)]
pub struct GenerateDocumentRequest {
    pub loan_id: i32,
    pub template_type: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNotificationRequest {
    pub user_id: i32,
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub message: String,
    #[validate(length(min = 1))]
    pub kind: String,
}

/// Ad-hoc valuation request; falls back to the latest stored market price
/// when no price is given
#[derive(Debug, Deserialize)]
pub struct ValuationRequest {
    pub weight_grams: Decimal,
    pub purity: i32,
    pub financing_ratio: Decimal,
    pub price_per_oz: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGoldPriceRequest {
    pub price_per_oz: Decimal,
    pub quoted_at: DateTime<Utc>,
}

/// Query for listing loans
#[derive(Debug, Deserialize, Default)]
pub struct ListLoansQuery {
    pub status: Option<LoanStatus>,
}

/// Day-window query (upcoming payments, price history)
#[derive(Debug, Deserialize)]
pub struct DaysQuery {
    pub days: Option<i64>,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table_allows_documented_paths() {
        use LoanStatus::*;
        assert!(Pending.can_transition_to(Verification));
        assert!(Verification.can_transition_to(Approved));
        assert!(Verification.can_transition_to(Documentation));
        assert!(Verification.can_transition_to(Rejected));
        assert!(Documentation.can_transition_to(Approved));
        assert!(Documentation.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Active));
        assert!(Active.can_transition_to(Completed));
    }

    #[test]
    fn test_transition_table_rejects_shortcuts() {
        use LoanStatus::*;
        assert!(!Pending.can_transition_to(Active));
        assert!(!Pending.can_transition_to(Approved));
        assert!(!Verification.can_transition_to(Active));
        assert!(!Approved.can_transition_to(Completed));
        assert!(!Active.can_transition_to(Rejected));
    }

    #[test]
    fn test_terminal_states_admit_nothing() {
        use LoanStatus::*;
        for target in [
            Pending,
            Verification,
            Documentation,
            Approved,
            Active,
            Completed,
            Rejected,
        ] {
            assert!(!Completed.can_transition_to(target));
            assert!(!Rejected.can_transition_to(target));
        }
    }

    #[test]
    fn test_frequency_intervals() {
        assert_eq!(PaymentFrequency::Monthly.interval_months(), 1);
        assert_eq!(PaymentFrequency::Quarterly.interval_months(), 3);
        assert_eq!(PaymentFrequency::Biannually.interval_months(), 6);
        assert_eq!(PaymentFrequency::Annually.interval_months(), 12);
    }

    #[test]
    fn test_effective_status_derives_overdue() {
        let now = Utc::now();
        let payment = Payment {
            id: 1,
            loan_id: 1,
            amount: Decimal::new(100, 0),
            due_date: now - chrono::Duration::days(1),
            paid_date: None,
            status: PaymentStatus::Pending,
            payment_method: None,
            reference_number: None,
            created_at: now,
        };
        assert_eq!(payment.effective_status(now), PaymentStatus::Overdue);

        let paid = Payment {
            status: PaymentStatus::Paid,
            paid_date: Some(now),
            ..payment
        };
        assert_eq!(paid.effective_status(now), PaymentStatus::Paid);
    }
}

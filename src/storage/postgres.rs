//! PostgreSQL storage backend
//!
//! Thin sqlx layer over the schema in `migrations/`. Identity comes from
//! serial columns and timestamps from `now()`, matching the in-memory
//! backend's contract.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use sqlx::PgPool;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    Client, Document, DocumentStatus, GoldItem, GoldPriceQuote, Loan, LoanStatus, Notification,
    NotificationStatus, Payment, PaymentStatus, User,
};
use crate::storage::{
    LoanPatch, NewClient, NewDocument, NewGoldItem, NewGoldPrice, NewLoan, NewNotification,
    NewPayment, NewUser, Storage,
};

/// PostgreSQL implementation of [`Storage`]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn get_user(&self, id: i32) -> ApiResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))
    }

    async fn get_user_by_username(&self, username: &str) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> ApiResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, full_name, email, phone, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn get_client(&self, id: i32) -> ApiResult<Client> {
        sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Client {} not found", id)))
    }

    async fn list_clients(&self) -> ApiResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>("SELECT * FROM clients ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(clients)
    }

    async fn create_client(&self, client: NewClient) -> ApiResult<Client> {
        let created = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (
                full_name, email, phone, address, identification_number,
                identification_type, nationality, state_of_residence, religion,
                race, regulatory_consent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(&client.full_name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(&client.identification_number)
        .bind(&client.identification_type)
        .bind(&client.nationality)
        .bind(&client.state_of_residence)
        .bind(&client.religion)
        .bind(&client.race)
        .bind(client.regulatory_consent)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn get_gold_item(&self, id: i32) -> ApiResult<GoldItem> {
        sqlx::query_as::<_, GoldItem>("SELECT * FROM gold_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Gold item {} not found", id)))
    }

    async fn list_gold_items(&self) -> ApiResult<Vec<GoldItem>> {
        let items = sqlx::query_as::<_, GoldItem>("SELECT * FROM gold_items ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn get_gold_items_by_ids(&self, ids: &[i32]) -> ApiResult<Vec<GoldItem>> {
        let found = sqlx::query_as::<_, GoldItem>("SELECT * FROM gold_items WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        // Re-order to the requested sequence, failing on the first absent id
        ids.iter()
            .map(|id| {
                found
                    .iter()
                    .find(|item| item.id == *id)
                    .cloned()
                    .ok_or_else(|| ApiError::NotFound(format!("Gold item {} not found", id)))
            })
            .collect()
    }

    async fn create_gold_item(&self, item: NewGoldItem) -> ApiResult<GoldItem> {
        let created = sqlx::query_as::<_, GoldItem>(
            r#"
            INSERT INTO gold_items (item_type, weight_grams, purity, description, estimated_value)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&item.item_type)
        .bind(item.weight_grams)
        .bind(item.purity)
        .bind(&item.description)
        .bind(item.estimated_value)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn get_loan(&self, id: i32) -> ApiResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Loan {} not found", id)))
    }

    async fn get_loan_by_contract_number(
        &self,
        contract_number: &str,
    ) -> ApiResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE contract_number = $1")
            .bind(contract_number)
            .fetch_optional(&self.pool)
            .await?;
        Ok(loan)
    }

    async fn list_loans(&self, status: Option<LoanStatus>) -> ApiResult<Vec<Loan>> {
        let loans = match status {
            Some(status) => {
                sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE status = $1 ORDER BY id")
                    .bind(status)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as::<_, Loan>("SELECT * FROM loans ORDER BY id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(loans)
    }

    async fn list_loans_by_client(&self, client_id: i32) -> ApiResult<Vec<Loan>> {
        let loans =
            sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE client_id = $1 ORDER BY id")
                .bind(client_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(loans)
    }

    async fn create_loan(&self, loan: NewLoan) -> ApiResult<Loan> {
        let created = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (
                client_id, contract_number, gold_item_ids, total_gold_value,
                financing_amount, financing_ratio, status, profit_rate,
                term_months, payment_frequency, shariah_contract, created_by,
                assigned_to
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(loan.client_id)
        .bind(&loan.contract_number)
        .bind(&loan.gold_item_ids)
        .bind(loan.total_gold_value)
        .bind(loan.financing_amount)
        .bind(loan.financing_ratio)
        .bind(loan.profit_rate)
        .bind(loan.term_months)
        .bind(loan.payment_frequency)
        .bind(loan.shariah_contract)
        .bind(loan.created_by)
        .bind(loan.assigned_to)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_loan(&self, id: i32, patch: LoanPatch) -> ApiResult<Loan> {
        let updated = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET
                total_gold_value = COALESCE($2, total_gold_value),
                financing_amount = COALESCE($3, financing_amount),
                financing_ratio = COALESCE($4, financing_ratio),
                profit_rate = COALESCE($5, profit_rate),
                assigned_to = COALESCE($6, assigned_to),
                start_date = COALESCE($7, start_date),
                end_date = COALESCE($8, end_date),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.total_gold_value)
        .bind(patch.financing_amount)
        .bind(patch.financing_ratio)
        .bind(patch.profit_rate)
        .bind(patch.assigned_to)
        .bind(patch.start_date)
        .bind(patch.end_date)
        .fetch_optional(&self.pool)
        .await?;
        updated.ok_or_else(|| ApiError::NotFound(format!("Loan {} not found", id)))
    }

    async fn set_loan_status(&self, id: i32, status: LoanStatus) -> ApiResult<Loan> {
        let updated = sqlx::query_as::<_, Loan>(
            "UPDATE loans SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        updated.ok_or_else(|| ApiError::NotFound(format!("Loan {} not found", id)))
    }

    async fn get_payment(&self, id: i32) -> ApiResult<Payment> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Payment {} not found", id)))
    }

    async fn list_payments_by_loan(&self, loan_id: i32) -> ApiResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE loan_id = $1 ORDER BY due_date",
        )
        .bind(loan_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    async fn list_upcoming_payments(&self, within_days: i64) -> ApiResult<Vec<Payment>> {
        let now = Utc::now();
        // End of the last day in the window, expressed as an exclusive bound
        let end = (now + Duration::days(within_days + 1))
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc();
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT * FROM payments
            WHERE status = 'pending' AND due_date >= $1 AND due_date < $2
            ORDER BY due_date
            "#,
        )
        .bind(now)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    async fn list_overdue_payments(&self) -> ApiResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT * FROM payments
            WHERE status = 'pending' AND due_date < $1
            ORDER BY due_date
            "#,
        )
        .bind(Utc::now())
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    async fn create_payment(&self, payment: NewPayment) -> ApiResult<Payment> {
        let created = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (loan_id, amount, due_date, status, payment_method, reference_number)
            VALUES ($1, $2, $3, 'pending', $4, $5)
            RETURNING *
            "#,
        )
        .bind(payment.loan_id)
        .bind(payment.amount)
        .bind(payment.due_date)
        .bind(&payment.payment_method)
        .bind(&payment.reference_number)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn set_payment_status(
        &self,
        id: i32,
        status: PaymentStatus,
        paid_date: Option<DateTime<Utc>>,
    ) -> ApiResult<Payment> {
        let paid_date = match status {
            PaymentStatus::Paid => Some(paid_date.unwrap_or_else(Utc::now)),
            PaymentStatus::Pending => None,
            PaymentStatus::Overdue => paid_date,
        };
        let updated = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments SET status = $2, paid_date = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(paid_date)
        .fetch_optional(&self.pool)
        .await?;
        updated.ok_or_else(|| ApiError::NotFound(format!("Payment {} not found", id)))
    }

    async fn get_document(&self, id: i32) -> ApiResult<Document> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Document {} not found", id)))
    }

    async fn list_documents(&self) -> ApiResult<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>("SELECT * FROM documents ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(documents)
    }

    async fn list_documents_by_loan(&self, loan_id: i32) -> ApiResult<Vec<Document>> {
        let documents =
            sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE loan_id = $1 ORDER BY id")
                .bind(loan_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(documents)
    }

    async fn create_document(&self, document: NewDocument) -> ApiResult<Document> {
        let created = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (
                loan_id, name, doc_type, status, document_number,
                issuing_authority, expiry_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(document.loan_id)
        .bind(&document.name)
        .bind(&document.doc_type)
        .bind(document.status)
        .bind(&document.document_number)
        .bind(&document.issuing_authority)
        .bind(document.expiry_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn set_document_status(&self, id: i32, status: DocumentStatus) -> ApiResult<Document> {
        let updated = sqlx::query_as::<_, Document>(
            "UPDATE documents SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        updated.ok_or_else(|| ApiError::NotFound(format!("Document {} not found", id)))
    }

    async fn get_notification(&self, id: i32) -> ApiResult<Notification> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Notification {} not found", id)))
    }

    async fn list_notifications_by_user(&self, user_id: i32) -> ApiResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }

    async fn list_unread_notifications_by_user(
        &self,
        user_id: i32,
    ) -> ApiResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 AND status = 'unread' ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }

    async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> ApiResult<Notification> {
        let created = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, title, message, kind, status)
            VALUES ($1, $2, $3, $4, 'unread')
            RETURNING *
            "#,
        )
        .bind(notification.user_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.kind)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn mark_notification_read(&self, id: i32) -> ApiResult<Notification> {
        let updated = sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(NotificationStatus::Read)
        .fetch_optional(&self.pool)
        .await?;
        updated.ok_or_else(|| ApiError::NotFound(format!("Notification {} not found", id)))
    }

    async fn latest_gold_price(&self) -> ApiResult<Option<GoldPriceQuote>> {
        let quote = sqlx::query_as::<_, GoldPriceQuote>(
            "SELECT * FROM gold_prices ORDER BY quoted_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(quote)
    }

    async fn gold_price_history(&self, days: i64) -> ApiResult<Vec<GoldPriceQuote>> {
        let since = Utc::now() - Duration::days(days);
        let quotes = sqlx::query_as::<_, GoldPriceQuote>(
            "SELECT * FROM gold_prices WHERE quoted_at >= $1 ORDER BY quoted_at",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(quotes)
    }

    async fn create_gold_price(&self, price: NewGoldPrice) -> ApiResult<GoldPriceQuote> {
        let created = sqlx::query_as::<_, GoldPriceQuote>(
            r#"
            INSERT INTO gold_prices (price_per_oz, quoted_at)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(price.price_per_oz)
        .bind(price.quoted_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }
}

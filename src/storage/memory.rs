//! In-memory storage backend
//!
//! Entities live in `HashMap`s behind a single `RwLock`, with monotonic
//! per-entity counters for identity assignment. Holding one lock for every
//! operation makes per-entity operations linearizable: a create followed by a
//! get from the same caller always observes the created entity.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    Client, Document, DocumentStatus, GoldItem, GoldPriceQuote, Loan, LoanStatus, Notification,
    NotificationStatus, Payment, PaymentStatus, User,
};
use crate::storage::{
    LoanPatch, NewClient, NewDocument, NewGoldItem, NewGoldPrice, NewLoan, NewNotification,
    NewPayment, NewUser, Storage,
};

#[derive(Default)]
struct Tables {
    users: HashMap<i32, User>,
    clients: HashMap<i32, Client>,
    gold_items: HashMap<i32, GoldItem>,
    loans: HashMap<i32, Loan>,
    payments: HashMap<i32, Payment>,
    documents: HashMap<i32, Document>,
    notifications: HashMap<i32, Notification>,
    gold_prices: HashMap<i32, GoldPriceQuote>,

    next_user_id: i32,
    next_client_id: i32,
    next_gold_item_id: i32,
    next_loan_id: i32,
    next_payment_id: i32,
    next_document_id: i32,
    next_notification_id: i32,
    next_gold_price_id: i32,
}

impl Tables {
    fn new() -> Self {
        Self {
            next_user_id: 1,
            next_client_id: 1,
            next_gold_item_id: 1,
            next_loan_id: 1,
            next_payment_id: 1,
            next_document_id: 1,
            next_notification_id: 1,
            next_gold_price_id: 1,
            ..Default::default()
        }
    }
}

/// In-memory implementation of [`Storage`]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// Due-date window check covering `[now, end of day now + days]`, so a
/// zero-day window still includes installments due later today.
fn in_upcoming_window(due: DateTime<Utc>, now: DateTime<Utc>, days: i64) -> bool {
    let end_day = (now + Duration::days(days)).date_naive();
    due >= now && due.date_naive() <= end_day
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_user(&self, id: i32) -> ApiResult<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))
    }

    async fn get_user_by_username(&self, username: &str) -> ApiResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> ApiResult<User> {
        let mut tables = self.tables.write().await;
        let id = tables.next_user_id;
        tables.next_user_id += 1;
        let user = User {
            id,
            username: user.username,
            password_hash: user.password_hash,
            full_name: user.full_name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_client(&self, id: i32) -> ApiResult<Client> {
        let tables = self.tables.read().await;
        tables
            .clients
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Client {} not found", id)))
    }

    async fn list_clients(&self) -> ApiResult<Vec<Client>> {
        let tables = self.tables.read().await;
        let mut clients: Vec<Client> = tables.clients.values().cloned().collect();
        clients.sort_by_key(|c| c.id);
        Ok(clients)
    }

    async fn create_client(&self, client: NewClient) -> ApiResult<Client> {
        let mut tables = self.tables.write().await;
        let id = tables.next_client_id;
        tables.next_client_id += 1;
        let client = Client {
            id,
            full_name: client.full_name,
            email: client.email,
            phone: client.phone,
            address: client.address,
            identification_number: client.identification_number,
            identification_type: client.identification_type,
            nationality: client.nationality,
            state_of_residence: client.state_of_residence,
            religion: client.religion,
            race: client.race,
            regulatory_consent: client.regulatory_consent,
            created_at: Utc::now(),
        };
        tables.clients.insert(id, client.clone());
        Ok(client)
    }

    async fn get_gold_item(&self, id: i32) -> ApiResult<GoldItem> {
        let tables = self.tables.read().await;
        tables
            .gold_items
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Gold item {} not found", id)))
    }

    async fn list_gold_items(&self) -> ApiResult<Vec<GoldItem>> {
        let tables = self.tables.read().await;
        let mut items: Vec<GoldItem> = tables.gold_items.values().cloned().collect();
        items.sort_by_key(|i| i.id);
        Ok(items)
    }

    async fn get_gold_items_by_ids(&self, ids: &[i32]) -> ApiResult<Vec<GoldItem>> {
        let tables = self.tables.read().await;
        ids.iter()
            .map(|id| {
                tables
                    .gold_items
                    .get(id)
                    .cloned()
                    .ok_or_else(|| ApiError::NotFound(format!("Gold item {} not found", id)))
            })
            .collect()
    }

    async fn create_gold_item(&self, item: NewGoldItem) -> ApiResult<GoldItem> {
        let mut tables = self.tables.write().await;
        let id = tables.next_gold_item_id;
        tables.next_gold_item_id += 1;
        let item = GoldItem {
            id,
            item_type: item.item_type,
            weight_grams: item.weight_grams,
            purity: item.purity,
            description: item.description,
            estimated_value: item.estimated_value,
            created_at: Utc::now(),
        };
        tables.gold_items.insert(id, item.clone());
        Ok(item)
    }

    async fn get_loan(&self, id: i32) -> ApiResult<Loan> {
        let tables = self.tables.read().await;
        tables
            .loans
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Loan {} not found", id)))
    }

    async fn get_loan_by_contract_number(
        &self,
        contract_number: &str,
    ) -> ApiResult<Option<Loan>> {
        let tables = self.tables.read().await;
        Ok(tables
            .loans
            .values()
            .find(|l| l.contract_number == contract_number)
            .cloned())
    }

    async fn list_loans(&self, status: Option<LoanStatus>) -> ApiResult<Vec<Loan>> {
        let tables = self.tables.read().await;
        let mut loans: Vec<Loan> = tables
            .loans
            .values()
            .filter(|l| status.map_or(true, |s| l.status == s))
            .cloned()
            .collect();
        loans.sort_by_key(|l| l.id);
        Ok(loans)
    }

    async fn list_loans_by_client(&self, client_id: i32) -> ApiResult<Vec<Loan>> {
        let tables = self.tables.read().await;
        let mut loans: Vec<Loan> = tables
            .loans
            .values()
            .filter(|l| l.client_id == client_id)
            .cloned()
            .collect();
        loans.sort_by_key(|l| l.id);
        Ok(loans)
    }

    async fn create_loan(&self, loan: NewLoan) -> ApiResult<Loan> {
        let mut tables = self.tables.write().await;
        let id = tables.next_loan_id;
        tables.next_loan_id += 1;
        let now = Utc::now();
        let loan = Loan {
            id,
            client_id: loan.client_id,
            contract_number: loan.contract_number,
            gold_item_ids: loan.gold_item_ids,
            total_gold_value: loan.total_gold_value,
            financing_amount: loan.financing_amount,
            financing_ratio: loan.financing_ratio,
            status: LoanStatus::Pending,
            profit_rate: loan.profit_rate,
            term_months: loan.term_months,
            payment_frequency: loan.payment_frequency,
            shariah_contract: loan.shariah_contract,
            start_date: None,
            end_date: None,
            created_at: now,
            updated_at: now,
            created_by: loan.created_by,
            assigned_to: loan.assigned_to,
        };
        tables.loans.insert(id, loan.clone());
        Ok(loan)
    }

    async fn update_loan(&self, id: i32, patch: LoanPatch) -> ApiResult<Loan> {
        let mut tables = self.tables.write().await;
        let loan = tables
            .loans
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound(format!("Loan {} not found", id)))?;
        if let Some(value) = patch.total_gold_value {
            loan.total_gold_value = value;
        }
        if let Some(amount) = patch.financing_amount {
            loan.financing_amount = amount;
        }
        if let Some(ratio) = patch.financing_ratio {
            loan.financing_ratio = ratio;
        }
        if let Some(rate) = patch.profit_rate {
            loan.profit_rate = rate;
        }
        if let Some(user_id) = patch.assigned_to {
            loan.assigned_to = Some(user_id);
        }
        if let Some(start) = patch.start_date {
            loan.start_date = Some(start);
        }
        if let Some(end) = patch.end_date {
            loan.end_date = Some(end);
        }
        loan.updated_at = Utc::now();
        Ok(loan.clone())
    }

    async fn set_loan_status(&self, id: i32, status: LoanStatus) -> ApiResult<Loan> {
        let mut tables = self.tables.write().await;
        let loan = tables
            .loans
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound(format!("Loan {} not found", id)))?;
        loan.status = status;
        loan.updated_at = Utc::now();
        Ok(loan.clone())
    }

    async fn get_payment(&self, id: i32) -> ApiResult<Payment> {
        let tables = self.tables.read().await;
        tables
            .payments
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Payment {} not found", id)))
    }

    async fn list_payments_by_loan(&self, loan_id: i32) -> ApiResult<Vec<Payment>> {
        let tables = self.tables.read().await;
        let mut payments: Vec<Payment> = tables
            .payments
            .values()
            .filter(|p| p.loan_id == loan_id)
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.due_date);
        Ok(payments)
    }

    async fn list_upcoming_payments(&self, within_days: i64) -> ApiResult<Vec<Payment>> {
        let now = Utc::now();
        let tables = self.tables.read().await;
        let mut payments: Vec<Payment> = tables
            .payments
            .values()
            .filter(|p| {
                p.status == PaymentStatus::Pending && in_upcoming_window(p.due_date, now, within_days)
            })
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.due_date);
        Ok(payments)
    }

    async fn list_overdue_payments(&self) -> ApiResult<Vec<Payment>> {
        let now = Utc::now();
        let tables = self.tables.read().await;
        let mut payments: Vec<Payment> = tables
            .payments
            .values()
            .filter(|p| p.status == PaymentStatus::Pending && p.due_date < now)
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.due_date);
        Ok(payments)
    }

    async fn create_payment(&self, payment: NewPayment) -> ApiResult<Payment> {
        let mut tables = self.tables.write().await;
        let id = tables.next_payment_id;
        tables.next_payment_id += 1;
        let payment = Payment {
            id,
            loan_id: payment.loan_id,
            amount: payment.amount,
            due_date: payment.due_date,
            paid_date: None,
            status: PaymentStatus::Pending,
            payment_method: payment.payment_method,
            reference_number: payment.reference_number,
            created_at: Utc::now(),
        };
        tables.payments.insert(id, payment.clone());
        Ok(payment)
    }

    async fn set_payment_status(
        &self,
        id: i32,
        status: PaymentStatus,
        paid_date: Option<DateTime<Utc>>,
    ) -> ApiResult<Payment> {
        let mut tables = self.tables.write().await;
        let payment = tables
            .payments
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound(format!("Payment {} not found", id)))?;
        payment.status = status;
        payment.paid_date = match status {
            PaymentStatus::Paid => Some(paid_date.unwrap_or_else(Utc::now)),
            PaymentStatus::Pending => None,
            PaymentStatus::Overdue => payment.paid_date,
        };
        Ok(payment.clone())
    }

    async fn get_document(&self, id: i32) -> ApiResult<Document> {
        let tables = self.tables.read().await;
        tables
            .documents
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Document {} not found", id)))
    }

    async fn list_documents(&self) -> ApiResult<Vec<Document>> {
        let tables = self.tables.read().await;
        let mut documents: Vec<Document> = tables.documents.values().cloned().collect();
        documents.sort_by_key(|d| d.id);
        Ok(documents)
    }

    async fn list_documents_by_loan(&self, loan_id: i32) -> ApiResult<Vec<Document>> {
        let tables = self.tables.read().await;
        let mut documents: Vec<Document> = tables
            .documents
            .values()
            .filter(|d| d.loan_id == loan_id)
            .cloned()
            .collect();
        documents.sort_by_key(|d| d.id);
        Ok(documents)
    }

    async fn create_document(&self, document: NewDocument) -> ApiResult<Document> {
        let mut tables = self.tables.write().await;
        let id = tables.next_document_id;
        tables.next_document_id += 1;
        let document = Document {
            id,
            loan_id: document.loan_id,
            name: document.name,
            doc_type: document.doc_type,
            status: document.status,
            document_number: document.document_number,
            issuing_authority: document.issuing_authority,
            expiry_date: document.expiry_date,
            created_at: Utc::now(),
        };
        tables.documents.insert(id, document.clone());
        Ok(document)
    }

    async fn set_document_status(&self, id: i32, status: DocumentStatus) -> ApiResult<Document> {
        let mut tables = self.tables.write().await;
        let document = tables
            .documents
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound(format!("Document {} not found", id)))?;
        document.status = status;
        Ok(document.clone())
    }

    async fn get_notification(&self, id: i32) -> ApiResult<Notification> {
        let tables = self.tables.read().await;
        tables
            .notifications
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Notification {} not found", id)))
    }

    async fn list_notifications_by_user(&self, user_id: i32) -> ApiResult<Vec<Notification>> {
        let tables = self.tables.read().await;
        let mut notifications: Vec<Notification> = tables
            .notifications
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notifications.sort_by_key(|n| n.id);
        Ok(notifications)
    }

    async fn list_unread_notifications_by_user(
        &self,
        user_id: i32,
    ) -> ApiResult<Vec<Notification>> {
        let tables = self.tables.read().await;
        let mut notifications: Vec<Notification> = tables
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && n.status == NotificationStatus::Unread)
            .cloned()
            .collect();
        notifications.sort_by_key(|n| n.id);
        Ok(notifications)
    }

    async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> ApiResult<Notification> {
        let mut tables = self.tables.write().await;
        let id = tables.next_notification_id;
        tables.next_notification_id += 1;
        let notification = Notification {
            id,
            user_id: notification.user_id,
            title: notification.title,
            message: notification.message,
            kind: notification.kind,
            status: NotificationStatus::Unread,
            created_at: Utc::now(),
        };
        tables.notifications.insert(id, notification.clone());
        Ok(notification)
    }

    async fn mark_notification_read(&self, id: i32) -> ApiResult<Notification> {
        let mut tables = self.tables.write().await;
        let notification = tables
            .notifications
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound(format!("Notification {} not found", id)))?;
        notification.status = NotificationStatus::Read;
        Ok(notification.clone())
    }

    async fn latest_gold_price(&self) -> ApiResult<Option<GoldPriceQuote>> {
        let tables = self.tables.read().await;
        Ok(tables
            .gold_prices
            .values()
            .max_by_key(|q| q.quoted_at)
            .cloned())
    }

    async fn gold_price_history(&self, days: i64) -> ApiResult<Vec<GoldPriceQuote>> {
        let since = Utc::now() - Duration::days(days);
        let tables = self.tables.read().await;
        let mut quotes: Vec<GoldPriceQuote> = tables
            .gold_prices
            .values()
            .filter(|q| q.quoted_at >= since)
            .cloned()
            .collect();
        quotes.sort_by_key(|q| q.quoted_at);
        Ok(quotes)
    }

    async fn create_gold_price(&self, price: NewGoldPrice) -> ApiResult<GoldPriceQuote> {
        let mut tables = self.tables.write().await;
        let id = tables.next_gold_price_id;
        tables.next_gold_price_id += 1;
        let quote = GoldPriceQuote {
            id,
            price_per_oz: price.price_per_oz,
            quoted_at: price.quoted_at,
            created_at: Utc::now(),
        };
        tables.gold_prices.insert(id, quote.clone());
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_loan() -> NewLoan {
        NewLoan {
            client_id: 1,
            contract_number: "ARN-2025-0001".to_string(),
            gold_item_ids: vec![1],
            total_gold_value: dec!(10000),
            financing_amount: dec!(6500),
            financing_ratio: dec!(0.65),
            profit_rate: dec!(4.5),
            term_months: 12,
            payment_frequency: crate::models::PaymentFrequency::Monthly,
            shariah_contract: crate::models::ShariahContract::Murabaha,
            created_by: 1,
            assigned_to: None,
        }
    }

    #[tokio::test]
    async fn test_create_then_get_observes_entity() {
        let storage = MemoryStorage::new();
        let created = storage.create_loan(sample_loan()).await.unwrap();
        let fetched = storage.get_loan(created.id).await.unwrap();
        assert_eq!(fetched.contract_number, "ARN-2025-0001");
        assert_eq!(fetched.status, LoanStatus::Pending);
        assert_eq!(fetched.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let storage = MemoryStorage::new();
        let first = storage.create_loan(sample_loan()).await.unwrap();
        let mut second_req = sample_loan();
        second_req.contract_number = "ARN-2025-0002".to_string();
        let second = storage.create_loan(second_req).await.unwrap();
        assert_eq!(second.id, first.id + 1);
    }

    #[tokio::test]
    async fn test_missing_id_is_not_found() {
        let storage = MemoryStorage::new();
        let err = storage.get_loan(99).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_gold_items_by_ids_preserves_order() {
        let storage = MemoryStorage::new();
        for purity in [24, 22, 18] {
            storage
                .create_gold_item(NewGoldItem {
                    item_type: "bar".to_string(),
                    weight_grams: dec!(10),
                    purity,
                    description: None,
                    estimated_value: dec!(1000),
                })
                .await
                .unwrap();
        }
        let items = storage.get_gold_items_by_ids(&[3, 1]).await.unwrap();
        assert_eq!(items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![3, 1]);

        let err = storage.get_gold_items_by_ids(&[1, 42]).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_latest_gold_price_is_most_recent_by_quote_date() {
        let storage = MemoryStorage::new();
        let now = Utc::now();
        storage
            .create_gold_price(NewGoldPrice {
                price_per_oz: dec!(8800),
                quoted_at: now - Duration::days(2),
            })
            .await
            .unwrap();
        storage
            .create_gold_price(NewGoldPrice {
                price_per_oz: dec!(8889.25),
                quoted_at: now,
            })
            .await
            .unwrap();
        // Inserted out of order on purpose
        storage
            .create_gold_price(NewGoldPrice {
                price_per_oz: dec!(8850),
                quoted_at: now - Duration::days(1),
            })
            .await
            .unwrap();

        let latest = storage.latest_gold_price().await.unwrap().unwrap();
        assert_eq!(latest.price_per_oz, dec!(8889.25));
    }

    #[tokio::test]
    async fn test_upcoming_window_filters_and_sorts() {
        let storage = MemoryStorage::new();
        let now = Utc::now();
        let mk = |due: DateTime<Utc>| NewPayment {
            loan_id: 1,
            amount: dec!(500),
            due_date: due,
            payment_method: None,
            reference_number: None,
        };
        let in_3 = storage.create_payment(mk(now + Duration::days(3))).await.unwrap();
        let in_1 = storage.create_payment(mk(now + Duration::days(1))).await.unwrap();
        let past = storage.create_payment(mk(now - Duration::days(1))).await.unwrap();
        let far = storage.create_payment(mk(now + Duration::days(30))).await.unwrap();

        let upcoming = storage.list_upcoming_payments(7).await.unwrap();
        let ids: Vec<i32> = upcoming.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![in_1.id, in_3.id]);

        let overdue = storage.list_overdue_payments().await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, past.id);
        assert!(upcoming.iter().all(|p| p.id != far.id));
    }
}

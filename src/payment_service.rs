//! Payment operations
//!
//! Recording installments, due-window queries with derived overdue status,
//! and reminder dispatch. Stored payment status only ever moves between
//! `pending` and `paid`; `overdue` exists purely in the read path.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::models::{CreatePaymentRequest, Payment, PaymentStatus, UpdatePaymentStatusRequest};
use crate::storage::{NewNotification, NewPayment, Storage};

/// Default look-ahead for the upcoming-payments query, in days
pub const DEFAULT_UPCOMING_DAYS: i64 = 7;

/// Look-ahead for reminder dispatch, in days
pub const REMINDER_WINDOW_DAYS: i64 = 3;

pub struct PaymentService {
    storage: Arc<dyn Storage>,
}

impl PaymentService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Schedule an ad-hoc installment against an existing loan.
    pub async fn create_payment(&self, request: CreatePaymentRequest) -> ApiResult<Payment> {
        if request.amount <= Decimal::ZERO {
            return Err(ApiError::Validation(
                "Payment amount must be positive".to_string(),
            ));
        }
        self.storage.get_loan(request.loan_id).await?;
        self.storage
            .create_payment(NewPayment {
                loan_id: request.loan_id,
                amount: request.amount,
                due_date: request.due_date,
                payment_method: request.payment_method,
                reference_number: request.reference_number,
            })
            .await
    }

    pub async fn get_payment(&self, id: i32) -> ApiResult<Payment> {
        let payment = self.storage.get_payment(id).await?;
        Ok(with_effective_status(payment, Utc::now()))
    }

    /// Update an installment's status. Recording a payment that is already
    /// paid fails; `overdue` cannot be written because it is derived.
    pub async fn update_payment_status(
        &self,
        id: i32,
        request: UpdatePaymentStatusRequest,
    ) -> ApiResult<Payment> {
        if request.status == PaymentStatus::Overdue {
            return Err(ApiError::Validation(
                "Overdue status is derived from the due date and cannot be set".to_string(),
            ));
        }
        let payment = self.storage.get_payment(id).await?;
        if request.status == PaymentStatus::Paid && payment.status == PaymentStatus::Paid {
            return Err(ApiError::AlreadyPaid(id));
        }

        let updated = self
            .storage
            .set_payment_status(id, request.status, request.paid_date)
            .await?;
        if request.status == PaymentStatus::Paid {
            info!(payment_id = id, loan_id = updated.loan_id, "Payment recorded");
        }
        Ok(updated)
    }

    pub async fn list_by_loan(&self, loan_id: i32) -> ApiResult<Vec<Payment>> {
        self.storage.get_loan(loan_id).await?;
        let now = Utc::now();
        let payments = self.storage.list_payments_by_loan(loan_id).await?;
        Ok(payments
            .into_iter()
            .map(|p| with_effective_status(p, now))
            .collect())
    }

    /// Pending installments due within the window, soonest first. A window
    /// of zero days covers only installments due today.
    pub async fn list_upcoming(&self, within_days: Option<i64>) -> ApiResult<Vec<Payment>> {
        let days = within_days.unwrap_or(DEFAULT_UPCOMING_DAYS);
        if days < 0 {
            return Err(ApiError::Validation(
                "Day window cannot be negative".to_string(),
            ));
        }
        self.storage.list_upcoming_payments(days).await
    }

    /// Pending installments past their due date, presented as overdue.
    pub async fn list_overdue(&self) -> ApiResult<Vec<Payment>> {
        let now = Utc::now();
        let payments = self.storage.list_overdue_payments().await?;
        Ok(payments
            .into_iter()
            .map(|p| with_effective_status(p, now))
            .collect())
    }

    /// Create a reminder notification for every installment due within the
    /// reminder window, addressed to the loan's assigned officer (falling
    /// back to its creator). Installments already reminded are skipped.
    /// Returns the number of reminders created.
    pub async fn dispatch_payment_reminders(&self) -> ApiResult<usize> {
        let due_soon = self
            .storage
            .list_upcoming_payments(REMINDER_WINDOW_DAYS)
            .await?;

        let mut created = 0;
        for payment in due_soon {
            let loan = self.storage.get_loan(payment.loan_id).await?;
            let recipient = loan.assigned_to.unwrap_or(loan.created_by);

            let marker = reminder_marker(payment.id);
            let existing = self
                .storage
                .list_notifications_by_user(recipient)
                .await?;
            if existing
                .iter()
                .any(|n| n.kind == "payment_reminder" && n.message.contains(&marker))
            {
                continue;
            }

            self.storage
                .create_notification(NewNotification {
                    user_id: recipient,
                    title: "Payment due soon".to_string(),
                    message: format!(
                        "{}: installment of {} on contract {} is due on {}",
                        marker,
                        payment.amount,
                        loan.contract_number,
                        payment.due_date.format("%Y-%m-%d")
                    ),
                    kind: "payment_reminder".to_string(),
                })
                .await?;
            created += 1;
        }

        if created > 0 {
            info!(count = created, "Payment reminders dispatched");
        }
        Ok(created)
    }
}

fn with_effective_status(mut payment: Payment, now: DateTime<Utc>) -> Payment {
    payment.status = payment.effective_status(now);
    payment
}

fn reminder_marker(payment_id: i32) -> String {
    format!("[payment {}]", payment_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentFrequency, ShariahContract, UserRole};
    use crate::storage::{MemoryStorage, NewClient, NewGoldItem, NewLoan, NewUser};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    async fn seeded() -> (PaymentService, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
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
        let service = PaymentService::new(storage.clone() as Arc<dyn Storage>);
        (service, storage)
    }

    fn request(due: DateTime<Utc>) -> CreatePaymentRequest {
        CreatePaymentRequest {
            loan_id: 1,
            amount: dec!(541.67),
            due_date: due,
            payment_method: None,
            reference_number: None,
        }
    }

    #[tokio::test]
    async fn test_recording_twice_fails_already_paid() {
        let (service, _) = seeded().await;
        let payment = service
            .create_payment(request(Utc::now() + Duration::days(5)))
            .await
            .unwrap();

        let paid = service
            .update_payment_status(
                payment.id,
                UpdatePaymentStatusRequest {
                    status: PaymentStatus::Paid,
                    paid_date: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(paid.status, PaymentStatus::Paid);
        assert!(paid.paid_date.is_some());

        let err = service
            .update_payment_status(
                payment.id,
                UpdatePaymentStatusRequest {
                    status: PaymentStatus::Paid,
                    paid_date: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AlreadyPaid(id) if id == payment.id));
    }

    #[tokio::test]
    async fn test_reverting_to_pending_clears_paid_date() {
        let (service, _) = seeded().await;
        let payment = service
            .create_payment(request(Utc::now() + Duration::days(5)))
            .await
            .unwrap();

        let paid = service
            .update_payment_status(
                payment.id,
                UpdatePaymentStatusRequest {
                    status: PaymentStatus::Paid,
                    paid_date: None,
                },
            )
            .await
            .unwrap();
        assert!(paid.paid_date.is_some());

        let reverted = service
            .update_payment_status(
                payment.id,
                UpdatePaymentStatusRequest {
                    status: PaymentStatus::Pending,
                    paid_date: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(reverted.status, PaymentStatus::Pending);
        assert!(reverted.paid_date.is_none());
    }

    #[tokio::test]
    async fn test_overdue_cannot_be_written() {
        let (service, _) = seeded().await;
        let payment = service
            .create_payment(request(Utc::now() + Duration::days(5)))
            .await
            .unwrap();
        let err = service
            .update_payment_status(
                payment.id,
                UpdatePaymentStatusRequest {
                    status: PaymentStatus::Overdue,
                    paid_date: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_overdue_is_derived_in_read_path() {
        let (service, _) = seeded().await;
        let payment = service
            .create_payment(request(Utc::now() - Duration::days(2)))
            .await
            .unwrap();

        let listed = service.list_by_loan(1).await.unwrap();
        assert_eq!(listed[0].status, PaymentStatus::Overdue);

        let overdue = service.list_overdue().await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, payment.id);
        assert_eq!(overdue[0].status, PaymentStatus::Overdue);

        // The stored status is untouched
        let fetched = service.get_payment(payment.id).await.unwrap();
        assert_eq!(fetched.status, PaymentStatus::Overdue);
    }

    #[tokio::test]
    async fn test_upcoming_excludes_paid_and_past_due() {
        let (service, _) = seeded().await;
        let soon = service
            .create_payment(request(Utc::now() + Duration::days(2)))
            .await
            .unwrap();
        let paid = service
            .create_payment(request(Utc::now() + Duration::days(3)))
            .await
            .unwrap();
        service
            .update_payment_status(
                paid.id,
                UpdatePaymentStatusRequest {
                    status: PaymentStatus::Paid,
                    paid_date: None,
                },
            )
            .await
            .unwrap();
        service
            .create_payment(request(Utc::now() - Duration::days(1)))
            .await
            .unwrap();

        let upcoming = service.list_upcoming(Some(7)).await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id, soon.id);

        assert!(service.list_upcoming(Some(-1)).await.is_err());
    }

    #[tokio::test]
    async fn test_reminders_target_creator_and_skip_duplicates() {
        let (service, storage) = seeded().await;
        service
            .create_payment(request(Utc::now() + Duration::days(1)))
            .await
            .unwrap();

        let created = service.dispatch_payment_reminders().await.unwrap();
        assert_eq!(created, 1);
        let notifications = storage.list_notifications_by_user(1).await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, "payment_reminder");

        // Second dispatch is a no-op for the same installment
        let created = service.dispatch_payment_reminders().await.unwrap();
        assert_eq!(created, 0);
        assert_eq!(storage.list_notifications_by_user(1).await.unwrap().len(), 1);
    }
}

//! Loan lifecycle service
//!
//! Owns every business rule around loans: financing invariants on create and
//! update, the status transition table, and schedule generation on
//! activation. Handlers never touch loan state except through this service.

use std::sync::Arc;

use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreateLoanRequest, Loan, LoanStatus, PaymentFrequency, UpdateLoanRequest,
};
use crate::storage::{LoanPatch, NewLoan, NewPayment, Storage};
use crate::valuation::is_policy_ratio;

/// Tolerance for the financing invariant, one cent in MYR
const FINANCING_EPSILON: Decimal = dec!(0.01);

/// One generated installment before persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledInstallment {
    pub due_date: DateTime<Utc>,
    pub amount: Decimal,
}

pub struct LoanService {
    storage: Arc<dyn Storage>,
}

impl LoanService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Create a loan in `pending` status after validating the financing
    /// terms against referenced entities.
    pub async fn create_loan(&self, request: CreateLoanRequest) -> ApiResult<Loan> {
        if request.gold_item_ids.is_empty() {
            return Err(ApiError::Validation(
                "A loan requires at least one gold item as collateral".to_string(),
            ));
        }
        if request.total_gold_value <= Decimal::ZERO {
            return Err(ApiError::Validation(
                "Total gold value must be positive".to_string(),
            ));
        }
        if request.financing_amount <= Decimal::ZERO {
            return Err(ApiError::Validation(
                "Financing amount must be positive".to_string(),
            ));
        }
        if request.profit_rate < Decimal::ZERO {
            return Err(ApiError::Validation(
                "Profit rate cannot be negative".to_string(),
            ));
        }
        if !is_policy_ratio(request.financing_ratio) {
            return Err(ApiError::Validation(format!(
                "Financing ratio {} is not an offered ratio",
                request.financing_ratio
            )));
        }
        check_financing_invariant(
            request.total_gold_value,
            request.financing_amount,
            request.financing_ratio,
        )?;
        validate_term(request.term_months, request.payment_frequency)?;

        // Referenced entities must exist before the loan is written
        self.storage.get_client(request.client_id).await?;
        self.storage
            .get_gold_items_by_ids(&request.gold_item_ids)
            .await?;
        self.storage.get_user(request.created_by).await?;
        if let Some(officer_id) = request.assigned_to {
            self.storage.get_user(officer_id).await?;
        }

        if self
            .storage
            .get_loan_by_contract_number(&request.contract_number)
            .await?
            .is_some()
        {
            return Err(ApiError::Conflict(format!(
                "Contract number {} already exists",
                request.contract_number
            )));
        }

        let loan = self
            .storage
            .create_loan(NewLoan {
                client_id: request.client_id,
                contract_number: request.contract_number,
                gold_item_ids: request.gold_item_ids,
                total_gold_value: request.total_gold_value,
                financing_amount: request.financing_amount,
                financing_ratio: request.financing_ratio,
                profit_rate: request.profit_rate,
                term_months: request.term_months,
                payment_frequency: request.payment_frequency,
                shariah_contract: request.shariah_contract,
                created_by: request.created_by,
                assigned_to: request.assigned_to,
            })
            .await?;

        info!(
            loan_id = loan.id,
            contract_number = %loan.contract_number,
            "Loan created"
        );
        Ok(loan)
    }

    /// Apply a partial update, re-checking the financing invariant against
    /// the merged values whenever any of its fields change.
    pub async fn update_loan(&self, id: i32, request: UpdateLoanRequest) -> ApiResult<Loan> {
        let current = self.storage.get_loan(id).await?;
        if current.status.is_terminal() {
            return Err(ApiError::Conflict(format!(
                "Loan {} is {} and can no longer be edited",
                id,
                current.status.as_str()
            )));
        }

        if request.touches_financing() {
            let value = request.total_gold_value.unwrap_or(current.total_gold_value);
            let amount = request.financing_amount.unwrap_or(current.financing_amount);
            let ratio = request.financing_ratio.unwrap_or(current.financing_ratio);
            if value <= Decimal::ZERO || amount <= Decimal::ZERO {
                return Err(ApiError::Validation(
                    "Gold value and financing amount must be positive".to_string(),
                ));
            }
            if !is_policy_ratio(ratio) {
                return Err(ApiError::Validation(format!(
                    "Financing ratio {} is not an offered ratio",
                    ratio
                )));
            }
            check_financing_invariant(value, amount, ratio)?;
        }
        if let Some(rate) = request.profit_rate {
            if rate < Decimal::ZERO {
                return Err(ApiError::Validation(
                    "Profit rate cannot be negative".to_string(),
                ));
            }
        }
        if let Some(officer_id) = request.assigned_to {
            self.storage.get_user(officer_id).await?;
        }

        self.storage
            .update_loan(
                id,
                LoanPatch {
                    total_gold_value: request.total_gold_value,
                    financing_amount: request.financing_amount,
                    financing_ratio: request.financing_ratio,
                    profit_rate: request.profit_rate,
                    assigned_to: request.assigned_to,
                    start_date: None,
                    end_date: None,
                },
            )
            .await
    }

    /// Move a loan along the status machine. A move into `active` is routed
    /// through activation so an active loan always carries a schedule.
    pub async fn update_loan_status(&self, id: i32, target: LoanStatus) -> ApiResult<Loan> {
        let loan = self.storage.get_loan(id).await?;
        if !loan.status.can_transition_to(target) {
            return Err(ApiError::InvalidTransition {
                from: loan.status,
                to: target,
            });
        }
        if target == LoanStatus::Active {
            return self.activate(loan, None).await;
        }

        let updated = self.storage.set_loan_status(id, target).await?;
        info!(
            loan_id = id,
            from = loan.status.as_str(),
            to = target.as_str(),
            "Loan status changed"
        );
        Ok(updated)
    }

    /// Activate an approved loan: stamp the term dates and generate the
    /// repayment schedule in one pass.
    pub async fn activate_loan(
        &self,
        id: i32,
        start_date: Option<DateTime<Utc>>,
    ) -> ApiResult<Loan> {
        let loan = self.storage.get_loan(id).await?;
        if !loan.status.can_transition_to(LoanStatus::Active) {
            return Err(ApiError::InvalidTransition {
                from: loan.status,
                to: LoanStatus::Active,
            });
        }
        self.activate(loan, start_date).await
    }

    async fn activate(&self, loan: Loan, start_date: Option<DateTime<Utc>>) -> ApiResult<Loan> {
        let start = start_date.unwrap_or_else(Utc::now);
        let end = add_months(start, loan.term_months as u32)?;
        let schedule = build_schedule(
            loan.financing_amount,
            loan.profit_rate,
            loan.term_months,
            loan.payment_frequency,
            start,
        )?;

        for installment in &schedule {
            self.storage
                .create_payment(NewPayment {
                    loan_id: loan.id,
                    amount: installment.amount,
                    due_date: installment.due_date,
                    payment_method: None,
                    reference_number: None,
                })
                .await?;
        }

        self.storage
            .update_loan(
                loan.id,
                LoanPatch {
                    start_date: Some(start),
                    end_date: Some(end),
                    ..Default::default()
                },
            )
            .await?;
        let activated = self.storage.set_loan_status(loan.id, LoanStatus::Active).await?;

        info!(
            loan_id = loan.id,
            installments = schedule.len(),
            "Loan activated with repayment schedule"
        );
        Ok(activated)
    }
}

/// `financing_amount` must equal `total_gold_value * financing_ratio` to
/// within one cent.
fn check_financing_invariant(
    total_gold_value: Decimal,
    financing_amount: Decimal,
    financing_ratio: Decimal,
) -> ApiResult<()> {
    let expected = total_gold_value * financing_ratio;
    let delta = (financing_amount - expected).abs();
    if delta > FINANCING_EPSILON {
        return Err(ApiError::Validation(format!(
            "Financing amount {} does not match gold value {} at ratio {}",
            financing_amount, total_gold_value, financing_ratio
        )));
    }
    Ok(())
}

fn validate_term(term_months: i32, frequency: PaymentFrequency) -> ApiResult<()> {
    if term_months <= 0 {
        return Err(ApiError::Validation(
            "Term must be a positive number of months".to_string(),
        ));
    }
    let interval = frequency.interval_months() as i32;
    if term_months % interval != 0 {
        return Err(ApiError::Validation(format!(
            "Term of {} months does not divide into {}-month installments",
            term_months, interval
        )));
    }
    Ok(())
}

fn add_months(date: DateTime<Utc>, months: u32) -> ApiResult<DateTime<Utc>> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| ApiError::Internal("Loan term date out of range".to_string()))
}

/// Generate the repayment schedule for an activated loan.
///
/// Total payable is `financing * (1 + profit_rate/100 * term/12)`, split into
/// equal installments rounded to cents; the final installment absorbs the
/// rounding remainder so the schedule sums exactly to the total.
pub fn build_schedule(
    financing_amount: Decimal,
    profit_rate: Decimal,
    term_months: i32,
    frequency: PaymentFrequency,
    start: DateTime<Utc>,
) -> ApiResult<Vec<ScheduledInstallment>> {
    validate_term(term_months, frequency)?;
    let interval = frequency.interval_months();
    let count = term_months as u32 / interval;

    let years = Decimal::from(term_months) / dec!(12);
    let total = (financing_amount * (Decimal::ONE + profit_rate / dec!(100) * years)).round_dp(2);
    let installment = (total / Decimal::from(count)).round_dp(2);
    let last = total - installment * Decimal::from(count - 1);

    let mut schedule = Vec::with_capacity(count as usize);
    for k in 1..=count {
        let amount = if k == count { last } else { installment };
        schedule.push(ScheduledInstallment {
            due_date: add_months(start, interval * k)?,
            amount,
        });
    }
    Ok(schedule)
}

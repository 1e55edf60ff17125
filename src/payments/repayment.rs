use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use tracing::info;

use crate::decimal::Money;
use crate::entities::{LoanContract, LoanTransaction};
use crate::errors::{LoanError, Result};
use crate::events::{Event, EventStore};
use crate::lifecycle::validate_transition;
use crate::reference::ReferenceCodeGenerator;
use crate::repository::LoanRepository;
use crate::types::{ContractId, EntityKind, LoanStatus, TransactionType};

/// applies repayments against an active contract's schedule
#[derive(Debug, Default)]
pub struct RepaymentProcessor;

impl RepaymentProcessor {
    pub fn new() -> Self {
        Self
    }

    /// settle the earliest scheduled installment
    ///
    /// The installment records `amount` as paid; the balance moves by the
    /// installment's own principal.
    pub fn repay<R, G>(
        &self,
        repository: &mut R,
        codes: &mut G,
        contract_id: ContractId,
        amount: Money,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<LoanTransaction>
    where
        R: LoanRepository,
        G: ReferenceCodeGenerator,
    {
        if !amount.is_positive() {
            return Err(LoanError::InvalidInput {
                message: format!("repayment amount must be positive: {}", amount),
            });
        }

        let contract = active_contract(repository, contract_id)?;

        let installment = repository
            .find_installments(contract_id)?
            .into_iter()
            .find(|row| row.is_scheduled())
            .ok_or(LoanError::NoScheduledInstallment { contract_id })?;

        let now = time_provider.now();
        repository.mark_installment_paid(installment.id, now.date_naive(), amount)?;

        let balance_after = (contract.outstanding_balance - installment.principal).max(Money::ZERO);
        let interest_paid = contract.total_interest_paid + installment.interest;
        repository.update_contract_balance(contract_id, balance_after, interest_paid)?;

        let mut transaction = LoanTransaction {
            id: 0,
            transaction_no: codes.next_code(EntityKind::LoanTransaction, now),
            contract_id,
            transaction_type: TransactionType::Repayment,
            amount,
            balance_after,
            transacted_at: now,
            description: format!("installment {} repayment", installment.installment_no),
        };
        transaction.id = repository.insert_transaction(transaction.clone())?;

        events.emit(Event::RepaymentApplied {
            contract_id,
            installment_no: installment.installment_no,
            amount,
            principal_portion: installment.principal,
            interest_portion: installment.interest,
            balance_after,
            timestamp: now,
        });

        if balance_after.is_zero() {
            close(repository, &contract, LoanStatus::Completed, "loan fully repaid", events, now)?;
        }

        info!(
            contract_id,
            installment_no = installment.installment_no,
            amount = %amount,
            balance_after = %balance_after,
            "repayment applied"
        );

        Ok(transaction)
    }

    /// settle every remaining installment and close the contract
    pub fn early_repay<R, G>(
        &self,
        repository: &mut R,
        codes: &mut G,
        contract_id: ContractId,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<LoanTransaction>
    where
        R: LoanRepository,
        G: ReferenceCodeGenerator,
    {
        let contract = active_contract(repository, contract_id)?;

        let now = time_provider.now();
        let today = now.date_naive();
        let mut settled = 0u32;
        let mut interest_settled = Money::ZERO;
        for row in repository
            .find_installments(contract_id)?
            .into_iter()
            .filter(|row| row.is_scheduled())
        {
            repository.mark_installment_paid(row.id, today, row.total)?;
            interest_settled += row.interest;
            settled += 1;
        }

        let payoff = contract.outstanding_balance;
        repository.update_contract_balance(
            contract_id,
            Money::ZERO,
            contract.total_interest_paid + interest_settled,
        )?;

        close(repository, &contract, LoanStatus::EarlyRepaid, "early repayment", events, now)?;

        let mut transaction = LoanTransaction {
            id: 0,
            transaction_no: codes.next_code(EntityKind::LoanTransaction, now),
            contract_id,
            transaction_type: TransactionType::EarlyRepayment,
            amount: payoff,
            balance_after: Money::ZERO,
            transacted_at: now,
            description: format!("early repayment of {} installments", settled),
        };
        transaction.id = repository.insert_transaction(transaction.clone())?;

        events.emit(Event::EarlyRepaymentApplied {
            contract_id,
            amount: payoff,
            installments_settled: settled,
            interest_settled,
            timestamp: now,
        });

        info!(
            contract_id,
            amount = %payoff,
            installments_settled = settled,
            "early repayment applied"
        );

        Ok(transaction)
    }
}

fn active_contract<R: LoanRepository>(repository: &R, contract_id: ContractId) -> Result<LoanContract> {
    let contract = repository
        .find_contract(contract_id)?
        .ok_or_else(|| LoanError::not_found("LoanContract", contract_id))?;

    if contract.status != LoanStatus::Active {
        return Err(LoanError::InvalidState {
            current: contract.status.to_string(),
            expected: LoanStatus::Active.to_string(),
        });
    }

    Ok(contract)
}

fn close<R: LoanRepository>(
    repository: &mut R,
    contract: &LoanContract,
    status: LoanStatus,
    reason: &str,
    events: &mut EventStore,
    now: DateTime<Utc>,
) -> Result<()> {
    validate_transition(contract.status, status)?;
    repository.update_contract_status(contract.id, status)?;
    events.emit(Event::status_changed(
        EntityKind::LoanContract,
        contract.id,
        Some(contract.status),
        status,
        reason,
        now,
    ));
    Ok(())
}

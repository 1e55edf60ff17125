use hourglass_rs::SafeTimeProvider;
use tracing::info;

use crate::decimal::Money;
use crate::entities::{Installment, LoanContract, LoanTransaction};
use crate::errors::{LoanError, Result};
use crate::events::{Event, EventStore};
use crate::lifecycle::validate_transition;
use crate::payments::amortization::{add_months, AmortizationSchedule};
use crate::reference::ReferenceCodeGenerator;
use crate::repository::LoanRepository;
use crate::types::{ApplicationId, EntityKind, LoanStatus, TransactionType};

/// turns an approved application into an active, disbursed contract
#[derive(Debug, Default)]
pub struct ContractExecutor;

impl ContractExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Execute the loan for an approved application.
    ///
    /// Writes the contract, its schedule and the disbursement transaction.
    /// Callers run this inside [`LoanRepository::unit_of_work`] so a failure
    /// at any step leaves nothing behind.
    pub fn execute<R, G>(
        &self,
        repository: &mut R,
        codes: &mut G,
        application_id: ApplicationId,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<LoanContract>
    where
        R: LoanRepository,
        G: ReferenceCodeGenerator,
    {
        let application = repository
            .find_application(application_id)?
            .ok_or_else(|| LoanError::not_found("LoanApplication", application_id))?;

        validate_transition(application.status, LoanStatus::Executed)?;

        let assessment = repository
            .find_assessment_by_application(application_id)?
            .ok_or_else(|| LoanError::not_found("CreditAssessment", application_id))?;

        let terms = assessment.approved_terms.ok_or_else(|| LoanError::InvalidState {
            current: format!("assessment {:?} without approved terms", assessment.decision),
            expected: "approved terms".to_string(),
        })?;

        let now = time_provider.now();
        let start_date = now.date_naive();
        let contract_no = codes.next_code(EntityKind::LoanContract, now);

        let schedule = AmortizationSchedule::generate(
            0,
            terms.amount,
            terms.rate,
            terms.term_months,
            application.repayment_method,
            start_date,
        )?;

        let mut contract = LoanContract {
            id: 0,
            contract_no,
            application_id,
            customer_id: application.customer_id,
            principal: terms.amount,
            interest_rate: terms.rate,
            term_months: terms.term_months,
            repayment_method: application.repayment_method,
            monthly_payment: schedule.monthly_payment,
            outstanding_balance: terms.amount,
            total_interest_paid: Money::ZERO,
            status: LoanStatus::Executed,
            start_date,
            end_date: add_months(start_date, terms.term_months)?,
            executed_at: now,
        };

        contract.id = repository.insert_contract(contract.clone())?;
        let contract_id = contract.id;
        events.emit(Event::status_changed(
            EntityKind::LoanContract,
            contract_id,
            None,
            LoanStatus::Executed,
            "contract executed",
            now,
        ));

        validate_transition(contract.status, LoanStatus::Active)?;
        repository.update_contract_status(contract_id, LoanStatus::Active)?;
        events.emit(Event::status_changed(
            EntityKind::LoanContract,
            contract_id,
            Some(LoanStatus::Executed),
            LoanStatus::Active,
            "loan disbursed",
            now,
        ));
        let contract = contract.with_status(LoanStatus::Active);

        repository.update_application_status(application_id, LoanStatus::Executed)?;
        events.emit(Event::status_changed(
            EntityKind::LoanApplication,
            application_id,
            Some(application.status),
            LoanStatus::Executed,
            format!("contract {} executed", contract.contract_no),
            now,
        ));

        let installments = schedule
            .installments
            .into_iter()
            .map(|row| Installment { contract_id, ..row })
            .collect();
        repository.insert_installments(installments)?;

        let transaction = LoanTransaction {
            id: 0,
            transaction_no: codes.next_code(EntityKind::LoanTransaction, now),
            contract_id,
            transaction_type: TransactionType::Disbursement,
            amount: contract.principal,
            balance_after: contract.principal,
            transacted_at: now,
            description: "loan disbursement".to_string(),
        };
        repository.insert_transaction(transaction)?;

        events.emit(Event::LoanDisbursed {
            contract_id,
            contract_no: contract.contract_no.clone(),
            principal: contract.principal,
            monthly_payment: contract.monthly_payment,
            timestamp: now,
        });

        info!(
            contract_id,
            contract_no = %contract.contract_no,
            principal = %contract.principal,
            monthly_payment = %contract.monthly_payment,
            "loan executed"
        );

        Ok(contract)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::CreditGrade;
    use crate::decimal::Rate;
    use crate::entities::{ApprovedTerms, CreditAssessment, Customer, LoanApplication};
    use crate::reference::DateSequenceCodes;
    use crate::repository::InMemoryRepository;
    use crate::types::{
        AssessmentDecision, AssessmentId, ContractId, CustomerId, EmploymentType, InstallmentId,
        InstallmentStatus, RepaymentMethod, TransactionId,
    };
    use chrono::{NaiveDate, TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    fn time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2026, 1, 31, 9, 0, 0).unwrap(),
        ))
    }

    fn seed<R: LoanRepository>(
        repo: &mut R,
        status: LoanStatus,
        decision: AssessmentDecision,
        method: RepaymentMethod,
    ) -> ApplicationId {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        let customer_id = repo
            .insert_customer(Customer {
                id: 0,
                customer_no: "CUS202601020001".to_string(),
                name: "Park Seoyeon".to_string(),
                email: "seoyeon@example.com".to_string(),
                phone: "010-2222-3333".to_string(),
                annual_income: Money::from_major(80_000_000),
                employment_type: EmploymentType::Regular,
                company: Some("Hanbit".to_string()),
                birth_date: NaiveDate::from_ymd_opt(1992, 7, 1).unwrap(),
                created_at: now,
            })
            .unwrap();
        let application_id = repo
            .insert_application(LoanApplication {
                id: 0,
                application_no: "APP202601020001".to_string(),
                customer_id,
                requested_amount: Money::from_major(10_000_000),
                requested_term_months: 12,
                repayment_method: method,
                existing_loan_amount: Money::ZERO,
                purpose: "car".to_string(),
                status,
                applied_at: Some(now),
                created_at: now,
            })
            .unwrap();
        let approved = decision == AssessmentDecision::Approved;
        repo.insert_assessment(CreditAssessment {
            id: 0,
            application_id,
            credit_score: if approved { 900 } else { 450 },
            credit_grade: if approved { CreditGrade::Grade1 } else { CreditGrade::Grade10 },
            dsr_ratio: Rate::from_percent(dec!(15.00)),
            decision,
            approved_terms: approved.then(|| ApprovedTerms {
                rate: Rate::from_percent(dec!(5.0)),
                amount: Money::from_major(10_000_000),
                term_months: 12,
            }),
            rejection_reason: (!approved).then(|| "credit score insufficient".to_string()),
            assessed_at: now,
        })
        .unwrap();
        application_id
    }

    #[test]
    fn test_execute_creates_active_contract() {
        let mut repo = InMemoryRepository::new();
        let mut codes = DateSequenceCodes::new();
        let mut events = EventStore::new();
        let id = seed(&mut repo, LoanStatus::Approved, AssessmentDecision::Approved, RepaymentMethod::Annuity);

        let contract = ContractExecutor::new()
            .execute(&mut repo, &mut codes, id, &time(), &mut events)
            .unwrap();

        assert_eq!(contract.status, LoanStatus::Active);
        assert_eq!(contract.contract_no, "CNT202601310001");
        assert_eq!(contract.outstanding_balance, Money::from_major(10_000_000));
        assert_eq!(contract.start_date, NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
        assert_eq!(contract.end_date, NaiveDate::from_ymd_opt(2027, 1, 31).unwrap());
        assert!(contract.monthly_payment > Money::from_major(850_000));
        assert!(contract.monthly_payment < Money::from_major(860_000));

        let stored = repo.find_contract(contract.id).unwrap().unwrap();
        assert_eq!(stored, contract);
        assert_eq!(repo.find_application(id).unwrap().unwrap().status, LoanStatus::Executed);

        let rows = repo.find_installments(contract.id).unwrap();
        assert_eq!(rows.len(), 12);
        assert!(rows.iter().all(|r| r.contract_id == contract.id));
        assert!(rows.iter().all(|r| r.status == InstallmentStatus::Scheduled));
        assert_eq!(rows[0].due_date, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());

        let transactions = repo.find_transactions(contract.id).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].transaction_type, TransactionType::Disbursement);
        assert_eq!(transactions[0].amount, Money::from_major(10_000_000));
        assert_eq!(transactions[0].balance_after, Money::from_major(10_000_000));

        assert_eq!(
            events.status_trail(EntityKind::LoanContract, contract.id),
            vec![
                (None, LoanStatus::Executed),
                (Some(LoanStatus::Executed), LoanStatus::Active),
            ]
        );
        assert_eq!(
            events.status_trail(EntityKind::LoanApplication, id),
            vec![(Some(LoanStatus::Approved), LoanStatus::Executed)]
        );
    }

    #[test]
    fn test_bullet_contract_reports_interest_as_payment() {
        let mut repo = InMemoryRepository::new();
        let id = seed(&mut repo, LoanStatus::Approved, AssessmentDecision::Approved, RepaymentMethod::Bullet);

        let contract = ContractExecutor::new()
            .execute(&mut repo, &mut DateSequenceCodes::new(), id, &time(), &mut EventStore::new())
            .unwrap();

        // 10M * 0.0041666667
        assert_eq!(contract.monthly_payment, Money::from_str_exact("41666.67").unwrap());
    }

    #[test]
    fn test_rejected_application_cannot_execute() {
        let mut repo = InMemoryRepository::new();
        let id = seed(&mut repo, LoanStatus::Rejected, AssessmentDecision::Rejected, RepaymentMethod::Annuity);

        let err = ContractExecutor::new()
            .execute(&mut repo, &mut DateSequenceCodes::new(), id, &time(), &mut EventStore::new())
            .unwrap_err();

        assert_eq!(
            err,
            LoanError::InvalidTransition {
                from: LoanStatus::Rejected,
                to: LoanStatus::Executed,
            }
        );
        assert!(repo.find_all_contracts().unwrap().is_empty());
    }

    #[test]
    fn test_assessment_without_terms_is_invalid_state() {
        let mut repo = InMemoryRepository::new();
        let id = seed(&mut repo, LoanStatus::Approved, AssessmentDecision::ManualReview, RepaymentMethod::Annuity);

        let err = ContractExecutor::new()
            .execute(&mut repo, &mut DateSequenceCodes::new(), id, &time(), &mut EventStore::new())
            .unwrap_err();

        assert!(matches!(err, LoanError::InvalidState { .. }));
    }

    #[test]
    fn test_missing_assessment_is_not_found() {
        let mut repo = InMemoryRepository::new();
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        let id = repo
            .insert_application(LoanApplication {
                id: 0,
                application_no: "APP202601020009".to_string(),
                customer_id: 1,
                requested_amount: Money::from_major(1_000_000),
                requested_term_months: 6,
                repayment_method: RepaymentMethod::Annuity,
                existing_loan_amount: Money::ZERO,
                purpose: "travel".to_string(),
                status: LoanStatus::Approved,
                applied_at: None,
                created_at: now,
            })
            .unwrap();

        let err = ContractExecutor::new()
            .execute(&mut repo, &mut DateSequenceCodes::new(), id, &time(), &mut EventStore::new())
            .unwrap_err();

        assert!(matches!(err, LoanError::NotFound { ref entity, .. } if entity == "CreditAssessment"));
    }

    /// delegates to the in-memory store but refuses ledger writes
    #[derive(Default)]
    struct LedgerDownRepository {
        inner: InMemoryRepository,
    }

    impl LoanRepository for LedgerDownRepository {
        fn unit_of_work<T, F>(&mut self, work: F) -> Result<T>
        where
            F: FnOnce(&mut Self) -> Result<T>,
        {
            let snapshot = self.inner.clone();
            let result = work(self);
            if result.is_err() {
                self.inner = snapshot;
            }
            result
        }

        fn insert_customer(&mut self, customer: Customer) -> Result<CustomerId> {
            self.inner.insert_customer(customer)
        }
        fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
            self.inner.find_customer(id)
        }
        fn find_all_customers(&self) -> Result<Vec<Customer>> {
            self.inner.find_all_customers()
        }
        fn insert_application(&mut self, application: LoanApplication) -> Result<ApplicationId> {
            self.inner.insert_application(application)
        }
        fn find_application(&self, id: ApplicationId) -> Result<Option<LoanApplication>> {
            self.inner.find_application(id)
        }
        fn find_applications_by_customer(&self, customer_id: CustomerId) -> Result<Vec<LoanApplication>> {
            self.inner.find_applications_by_customer(customer_id)
        }
        fn find_all_applications(&self) -> Result<Vec<LoanApplication>> {
            self.inner.find_all_applications()
        }
        fn update_application(&mut self, application: &LoanApplication) -> Result<()> {
            self.inner.update_application(application)
        }
        fn update_application_status(&mut self, id: ApplicationId, status: LoanStatus) -> Result<()> {
            self.inner.update_application_status(id, status)
        }
        fn insert_assessment(&mut self, assessment: CreditAssessment) -> Result<AssessmentId> {
            self.inner.insert_assessment(assessment)
        }
        fn find_assessment_by_application(&self, id: ApplicationId) -> Result<Option<CreditAssessment>> {
            self.inner.find_assessment_by_application(id)
        }
        fn insert_contract(&mut self, contract: LoanContract) -> Result<ContractId> {
            self.inner.insert_contract(contract)
        }
        fn find_contract(&self, id: ContractId) -> Result<Option<LoanContract>> {
            self.inner.find_contract(id)
        }
        fn find_contracts_by_customer(&self, customer_id: CustomerId) -> Result<Vec<LoanContract>> {
            self.inner.find_contracts_by_customer(customer_id)
        }
        fn find_all_contracts(&self) -> Result<Vec<LoanContract>> {
            self.inner.find_all_contracts()
        }
        fn update_contract_status(&mut self, id: ContractId, status: LoanStatus) -> Result<()> {
            self.inner.update_contract_status(id, status)
        }
        fn update_contract_balance(&mut self, id: ContractId, outstanding: Money, interest: Money) -> Result<()> {
            self.inner.update_contract_balance(id, outstanding, interest)
        }
        fn insert_installments(&mut self, rows: Vec<Installment>) -> Result<()> {
            self.inner.insert_installments(rows)
        }
        fn find_installments(&self, contract_id: ContractId) -> Result<Vec<Installment>> {
            self.inner.find_installments(contract_id)
        }
        fn mark_installment_paid(&mut self, id: InstallmentId, date: NaiveDate, amount: Money) -> Result<()> {
            self.inner.mark_installment_paid(id, date, amount)
        }
        fn insert_transaction(&mut self, _transaction: LoanTransaction) -> Result<TransactionId> {
            Err(LoanError::Storage {
                message: "ledger unavailable".to_string(),
            })
        }
        fn find_transactions(&self, contract_id: ContractId) -> Result<Vec<LoanTransaction>> {
            self.inner.find_transactions(contract_id)
        }
    }

    #[test]
    fn test_failed_disbursement_rolls_back_everything() {
        let mut repo = LedgerDownRepository::default();
        let id = seed(&mut repo, LoanStatus::Approved, AssessmentDecision::Approved, RepaymentMethod::Annuity);
        let mut codes = DateSequenceCodes::new();
        let time = time();

        let err = repo
            .unit_of_work(|repo| {
                ContractExecutor::new().execute(repo, &mut codes, id, &time, &mut EventStore::new())
            })
            .unwrap_err();

        assert_eq!(
            err,
            LoanError::Storage {
                message: "ledger unavailable".to_string()
            }
        );
        assert!(repo.find_all_contracts().unwrap().is_empty());
        assert_eq!(repo.find_application(id).unwrap().unwrap().status, LoanStatus::Approved);
    }
}

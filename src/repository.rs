use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::decimal::Money;
use crate::entities::{
    CreditAssessment, Customer, Installment, LoanApplication, LoanContract, LoanTransaction,
};
use crate::errors::{LoanError, Result};
use crate::types::{
    ApplicationId, AssessmentId, ContractId, CustomerId, InstallmentId, InstallmentStatus,
    LoanStatus, TransactionId,
};

/// storage for lifecycle entities
///
/// Inserts ignore the incoming `id` and return the one assigned by the store.
/// Child lookups return rows in insertion order, installments ordered by
/// installment number.
pub trait LoanRepository {
    /// run `work` atomically: on error every change it made is discarded
    fn unit_of_work<T, F>(&mut self, work: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>;

    fn insert_customer(&mut self, customer: Customer) -> Result<CustomerId>;
    fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>>;
    fn find_all_customers(&self) -> Result<Vec<Customer>>;

    fn insert_application(&mut self, application: LoanApplication) -> Result<ApplicationId>;
    fn find_application(&self, id: ApplicationId) -> Result<Option<LoanApplication>>;
    fn find_applications_by_customer(&self, customer_id: CustomerId) -> Result<Vec<LoanApplication>>;
    fn find_all_applications(&self) -> Result<Vec<LoanApplication>>;
    fn update_application(&mut self, application: &LoanApplication) -> Result<()>;
    fn update_application_status(&mut self, id: ApplicationId, status: LoanStatus) -> Result<()>;

    fn insert_assessment(&mut self, assessment: CreditAssessment) -> Result<AssessmentId>;
    fn find_assessment_by_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<Option<CreditAssessment>>;

    fn insert_contract(&mut self, contract: LoanContract) -> Result<ContractId>;
    fn find_contract(&self, id: ContractId) -> Result<Option<LoanContract>>;
    fn find_contracts_by_customer(&self, customer_id: CustomerId) -> Result<Vec<LoanContract>>;
    fn find_all_contracts(&self) -> Result<Vec<LoanContract>>;
    fn update_contract_status(&mut self, id: ContractId, status: LoanStatus) -> Result<()>;
    fn update_contract_balance(
        &mut self,
        id: ContractId,
        outstanding_balance: Money,
        total_interest_paid: Money,
    ) -> Result<()>;

    fn insert_installments(&mut self, rows: Vec<Installment>) -> Result<()>;
    fn find_installments(&self, contract_id: ContractId) -> Result<Vec<Installment>>;
    fn mark_installment_paid(
        &mut self,
        id: InstallmentId,
        paid_date: NaiveDate,
        paid_amount: Money,
    ) -> Result<()>;

    fn insert_transaction(&mut self, transaction: LoanTransaction) -> Result<TransactionId>;
    fn find_transactions(&self, contract_id: ContractId) -> Result<Vec<LoanTransaction>>;
}

/// in-memory repository; rollback restores a snapshot taken when the unit of work began
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    next_id: u64,
    customers: BTreeMap<CustomerId, Customer>,
    applications: BTreeMap<ApplicationId, LoanApplication>,
    assessments: BTreeMap<AssessmentId, CreditAssessment>,
    contracts: BTreeMap<ContractId, LoanContract>,
    installments: BTreeMap<InstallmentId, Installment>,
    transactions: BTreeMap<TransactionId, LoanTransaction>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn assign_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl LoanRepository for InMemoryRepository {
    fn unit_of_work<T, F>(&mut self, work: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let snapshot = self.clone();
        match work(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    fn insert_customer(&mut self, mut customer: Customer) -> Result<CustomerId> {
        customer.id = self.assign_id();
        let id = customer.id;
        self.customers.insert(id, customer);
        Ok(id)
    }

    fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.customers.get(&id).cloned())
    }

    fn find_all_customers(&self) -> Result<Vec<Customer>> {
        Ok(self.customers.values().cloned().collect())
    }

    fn insert_application(&mut self, mut application: LoanApplication) -> Result<ApplicationId> {
        application.id = self.assign_id();
        let id = application.id;
        self.applications.insert(id, application);
        Ok(id)
    }

    fn find_application(&self, id: ApplicationId) -> Result<Option<LoanApplication>> {
        Ok(self.applications.get(&id).cloned())
    }

    fn find_applications_by_customer(&self, customer_id: CustomerId) -> Result<Vec<LoanApplication>> {
        Ok(self
            .applications
            .values()
            .filter(|a| a.customer_id == customer_id)
            .cloned()
            .collect())
    }

    fn find_all_applications(&self) -> Result<Vec<LoanApplication>> {
        Ok(self.applications.values().cloned().collect())
    }

    fn update_application(&mut self, application: &LoanApplication) -> Result<()> {
        let stored = self
            .applications
            .get_mut(&application.id)
            .ok_or_else(|| LoanError::not_found("LoanApplication", application.id))?;
        *stored = application.clone();
        Ok(())
    }

    fn update_application_status(&mut self, id: ApplicationId, status: LoanStatus) -> Result<()> {
        let stored = self
            .applications
            .get_mut(&id)
            .ok_or_else(|| LoanError::not_found("LoanApplication", id))?;
        stored.status = status;
        Ok(())
    }

    fn insert_assessment(&mut self, mut assessment: CreditAssessment) -> Result<AssessmentId> {
        if self
            .assessments
            .values()
            .any(|a| a.application_id == assessment.application_id)
        {
            return Err(LoanError::AlreadyAssessed {
                application_id: assessment.application_id,
            });
        }
        assessment.id = self.assign_id();
        let id = assessment.id;
        self.assessments.insert(id, assessment);
        Ok(id)
    }

    fn find_assessment_by_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<Option<CreditAssessment>> {
        Ok(self
            .assessments
            .values()
            .find(|a| a.application_id == application_id)
            .cloned())
    }

    fn insert_contract(&mut self, mut contract: LoanContract) -> Result<ContractId> {
        contract.id = self.assign_id();
        let id = contract.id;
        self.contracts.insert(id, contract);
        Ok(id)
    }

    fn find_contract(&self, id: ContractId) -> Result<Option<LoanContract>> {
        Ok(self.contracts.get(&id).cloned())
    }

    fn find_contracts_by_customer(&self, customer_id: CustomerId) -> Result<Vec<LoanContract>> {
        Ok(self
            .contracts
            .values()
            .filter(|c| c.customer_id == customer_id)
            .cloned()
            .collect())
    }

    fn find_all_contracts(&self) -> Result<Vec<LoanContract>> {
        Ok(self.contracts.values().cloned().collect())
    }

    fn update_contract_status(&mut self, id: ContractId, status: LoanStatus) -> Result<()> {
        let stored = self
            .contracts
            .get_mut(&id)
            .ok_or_else(|| LoanError::not_found("LoanContract", id))?;
        stored.status = status;
        Ok(())
    }

    fn update_contract_balance(
        &mut self,
        id: ContractId,
        outstanding_balance: Money,
        total_interest_paid: Money,
    ) -> Result<()> {
        let stored = self
            .contracts
            .get_mut(&id)
            .ok_or_else(|| LoanError::not_found("LoanContract", id))?;
        stored.outstanding_balance = outstanding_balance;
        stored.total_interest_paid = total_interest_paid;
        Ok(())
    }

    fn insert_installments(&mut self, rows: Vec<Installment>) -> Result<()> {
        for mut row in rows {
            if !self.contracts.contains_key(&row.contract_id) {
                return Err(LoanError::not_found("LoanContract", row.contract_id));
            }
            row.id = self.assign_id();
            self.installments.insert(row.id, row);
        }
        Ok(())
    }

    fn find_installments(&self, contract_id: ContractId) -> Result<Vec<Installment>> {
        let mut rows: Vec<Installment> = self
            .installments
            .values()
            .filter(|i| i.contract_id == contract_id)
            .cloned()
            .collect();
        rows.sort_by_key(|i| i.installment_no);
        Ok(rows)
    }

    fn mark_installment_paid(
        &mut self,
        id: InstallmentId,
        paid_date: NaiveDate,
        paid_amount: Money,
    ) -> Result<()> {
        let stored = self
            .installments
            .get_mut(&id)
            .ok_or_else(|| LoanError::not_found("Installment", id))?;
        if stored.status != InstallmentStatus::Scheduled {
            return Err(LoanError::InvalidState {
                current: format!("{:?}", stored.status),
                expected: format!("{:?}", InstallmentStatus::Scheduled),
            });
        }
        *stored = stored.mark_paid(paid_date, paid_amount);
        Ok(())
    }

    fn insert_transaction(&mut self, mut transaction: LoanTransaction) -> Result<TransactionId> {
        if !self.contracts.contains_key(&transaction.contract_id) {
            return Err(LoanError::not_found("LoanContract", transaction.contract_id));
        }
        transaction.id = self.assign_id();
        let id = transaction.id;
        self.transactions.insert(id, transaction);
        Ok(id)
    }

    fn find_transactions(&self, contract_id: ContractId) -> Result<Vec<LoanTransaction>> {
        Ok(self
            .transactions
            .values()
            .filter(|t| t.contract_id == contract_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::types::{EmploymentType, RepaymentMethod};
    use chrono::{TimeZone, Utc};

    fn customer() -> Customer {
        Customer {
            id: 0,
            customer_no: "CUS202601010001".to_string(),
            name: "Lee Jiwon".to_string(),
            email: "jiwon@example.com".to_string(),
            phone: "010-0000-0000".to_string(),
            annual_income: Money::from_major(50_000_000),
            employment_type: EmploymentType::Regular,
            company: Some("Acme".to_string()),
            birth_date: NaiveDate::from_ymd_opt(1988, 3, 2).unwrap(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn contract(customer_id: CustomerId) -> LoanContract {
        LoanContract {
            id: 0,
            contract_no: "CNT202601010001".to_string(),
            application_id: 1,
            customer_id,
            principal: Money::from_major(1_000_000),
            interest_rate: Rate::from_percentage(5),
            term_months: 2,
            repayment_method: RepaymentMethod::EqualPrincipal,
            monthly_payment: Money::from_major(504_167),
            outstanding_balance: Money::from_major(1_000_000),
            total_interest_paid: Money::ZERO,
            status: LoanStatus::Active,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            executed_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn installment(contract_id: ContractId, installment_no: u32) -> Installment {
        Installment {
            id: 0,
            contract_id,
            installment_no,
            due_date: NaiveDate::from_ymd_opt(2026, 1 + installment_no, 1).unwrap(),
            principal: Money::from_major(500_000),
            interest: Money::from_major(4_167),
            total: Money::from_major(504_167),
            balance_after: Money::from_major(500_000),
            status: InstallmentStatus::Scheduled,
            paid_date: None,
            paid_amount: None,
        }
    }

    #[test]
    fn test_insert_assigns_distinct_ids() {
        let mut repo = InMemoryRepository::new();
        let a = repo.insert_customer(customer()).unwrap();
        let b = repo.insert_customer(customer()).unwrap();

        assert_ne!(a, b);
        assert_eq!(repo.find_customer(a).unwrap().unwrap().id, a);
        assert!(repo.find_customer(999).unwrap().is_none());
    }

    #[test]
    fn test_installments_ordered_by_number() {
        let mut repo = InMemoryRepository::new();
        let customer_id = repo.insert_customer(customer()).unwrap();
        let contract_id = repo.insert_contract(contract(customer_id)).unwrap();

        repo.insert_installments(vec![installment(contract_id, 2), installment(contract_id, 1)])
            .unwrap();

        let rows = repo.find_installments(contract_id).unwrap();
        assert_eq!(rows.iter().map(|r| r.installment_no).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_installment_cannot_be_paid_twice() {
        let mut repo = InMemoryRepository::new();
        let customer_id = repo.insert_customer(customer()).unwrap();
        let contract_id = repo.insert_contract(contract(customer_id)).unwrap();
        repo.insert_installments(vec![installment(contract_id, 1)]).unwrap();
        let row = repo.find_installments(contract_id).unwrap().remove(0);
        let paid_on = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();

        repo.mark_installment_paid(row.id, paid_on, Money::from_major(504_167))
            .unwrap();
        let err = repo
            .mark_installment_paid(row.id, paid_on, Money::from_major(504_167))
            .unwrap_err();

        assert!(matches!(err, LoanError::InvalidState { .. }));
        let stored = repo.find_installments(contract_id).unwrap().remove(0);
        assert_eq!(stored.status, InstallmentStatus::Paid);
        assert_eq!(stored.paid_date, Some(paid_on));
    }

    #[test]
    fn test_unit_of_work_rolls_back_on_error() {
        let mut repo = InMemoryRepository::new();
        let customer_id = repo.insert_customer(customer()).unwrap();

        let result: Result<()> = repo.unit_of_work(|repo| {
            let contract_id = repo.insert_contract(contract(customer_id))?;
            repo.update_contract_status(contract_id, LoanStatus::Completed)?;
            Err(LoanError::Storage {
                message: "disk full".to_string(),
            })
        });

        assert!(result.is_err());
        assert!(repo.find_all_contracts().unwrap().is_empty());
        assert!(repo.find_customer(customer_id).unwrap().is_some());
    }

    #[test]
    fn test_unit_of_work_commits_on_success() {
        let mut repo = InMemoryRepository::new();
        let customer_id = repo.insert_customer(customer()).unwrap();

        let contract_id = repo
            .unit_of_work(|repo| repo.insert_contract(contract(customer_id)))
            .unwrap();

        assert!(repo.find_contract(contract_id).unwrap().is_some());
    }

    #[test]
    fn test_second_assessment_rejected_by_store() {
        let mut repo = InMemoryRepository::new();
        let assessment = CreditAssessment {
            id: 0,
            application_id: 7,
            credit_score: 800,
            credit_grade: crate::assessment::CreditGrade::Grade3,
            dsr_ratio: Rate::from_percentage(20),
            decision: crate::types::AssessmentDecision::Approved,
            approved_terms: None,
            rejection_reason: None,
            assessed_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        };

        repo.insert_assessment(assessment.clone()).unwrap();
        let err = repo.insert_assessment(assessment).unwrap_err();
        assert_eq!(err, LoanError::AlreadyAssessed { application_id: 7 });
    }

    #[test]
    fn test_updates_on_missing_rows_fail() {
        let mut repo = InMemoryRepository::new();
        assert!(repo.update_contract_status(1, LoanStatus::Active).is_err());
        assert!(repo.update_application_status(1, LoanStatus::Applied).is_err());
        assert!(repo
            .update_contract_balance(1, Money::ZERO, Money::ZERO)
            .is_err());
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::assessment::CreditGrade;
use crate::decimal::{Money, Rate};
use crate::types::{
    ApplicationId, AssessmentDecision, AssessmentId, ContractId, CustomerId, EmploymentType,
    InstallmentId, InstallmentStatus, LoanStatus, RepaymentMethod, TransactionId, TransactionType,
};

// ids are 0 until the repository assigns one on insert

/// borrower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub customer_no: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub annual_income: Money,
    pub employment_type: EmploymentType,
    pub company: Option<String>,
    pub birth_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// customer registration input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub annual_income: Money,
    pub employment_type: EmploymentType,
    pub company: Option<String>,
    pub birth_date: NaiveDate,
}

/// loan application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub id: ApplicationId,
    pub application_no: String,
    pub customer_id: CustomerId,
    pub requested_amount: Money,
    pub requested_term_months: u32,
    pub repayment_method: RepaymentMethod,
    pub existing_loan_amount: Money,
    pub purpose: String,
    pub status: LoanStatus,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl LoanApplication {
    pub fn with_status(&self, status: LoanStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// pending means not yet decided
    pub fn is_pending(&self) -> bool {
        matches!(
            self.status,
            LoanStatus::Draft | LoanStatus::Applied | LoanStatus::Reviewing
        )
    }
}

/// application intake input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewApplication {
    pub customer_id: CustomerId,
    pub requested_amount: Money,
    pub requested_term_months: u32,
    pub repayment_method: RepaymentMethod,
    pub existing_loan_amount: Option<Money>,
    pub purpose: String,
}

/// terms granted by an approval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApprovedTerms {
    pub rate: Rate,
    pub amount: Money,
    pub term_months: u32,
}

/// credit assessment, at most one per application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditAssessment {
    pub id: AssessmentId,
    pub application_id: ApplicationId,
    pub credit_score: u32,
    pub credit_grade: CreditGrade,
    pub dsr_ratio: Rate,
    pub decision: AssessmentDecision,
    /// present only when approved
    pub approved_terms: Option<ApprovedTerms>,
    /// present only when rejected
    pub rejection_reason: Option<String>,
    pub assessed_at: DateTime<Utc>,
}

/// executed loan contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanContract {
    pub id: ContractId,
    pub contract_no: String,
    pub application_id: ApplicationId,
    pub customer_id: CustomerId,
    pub principal: Money,
    pub interest_rate: Rate,
    pub term_months: u32,
    pub repayment_method: RepaymentMethod,
    pub monthly_payment: Money,
    pub outstanding_balance: Money,
    pub total_interest_paid: Money,
    pub status: LoanStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub executed_at: DateTime<Utc>,
}

impl LoanContract {
    pub fn with_status(&self, status: LoanStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

/// one row of a repayment schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub id: InstallmentId,
    pub contract_id: ContractId,
    pub installment_no: u32,
    pub due_date: NaiveDate,
    pub principal: Money,
    pub interest: Money,
    pub total: Money,
    pub balance_after: Money,
    pub status: InstallmentStatus,
    pub paid_date: Option<NaiveDate>,
    pub paid_amount: Option<Money>,
}

impl Installment {
    pub fn is_scheduled(&self) -> bool {
        self.status == InstallmentStatus::Scheduled
    }

    pub fn mark_paid(&self, paid_date: NaiveDate, paid_amount: Money) -> Self {
        Self {
            status: InstallmentStatus::Paid,
            paid_date: Some(paid_date),
            paid_amount: Some(paid_amount),
            ..self.clone()
        }
    }
}

/// immutable ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTransaction {
    pub id: TransactionId,
    pub transaction_no: String,
    pub contract_id: ContractId,
    pub transaction_type: TransactionType,
    pub amount: Money,
    pub balance_after: Money,
    pub transacted_at: DateTime<Utc>,
    pub description: String,
}

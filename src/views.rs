use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::entities::{CreditAssessment, Installment, LoanApplication, LoanContract};
use crate::types::{
    ApplicationId, AssessmentDecision, ContractId, CustomerId, LoanStatus, RepaymentMethod,
};

/// contract with its repayment progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractView {
    pub id: ContractId,
    pub contract_no: String,
    pub customer_id: CustomerId,
    pub status: LoanStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub terms: TermsView,
    pub balances: BalanceView,
    pub progress: ProgressView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermsView {
    pub principal: Money,
    pub interest_rate: Rate,
    pub term_months: u32,
    pub repayment_method: RepaymentMethod,
    pub monthly_payment: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceView {
    pub outstanding_balance: Money,
    pub principal_repaid: Money,
    pub total_interest_paid: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressView {
    pub paid_installments: u32,
    pub remaining_installments: u32,
    pub next_due_date: Option<NaiveDate>,
    pub next_payment_amount: Option<Money>,
}

impl ContractView {
    /// `schedule` is the contract's installments in order
    pub fn from_contract(contract: &LoanContract, schedule: &[Installment]) -> Self {
        let next = schedule.iter().find(|row| row.is_scheduled());
        let remaining = schedule.iter().filter(|row| row.is_scheduled()).count() as u32;

        ContractView {
            id: contract.id,
            contract_no: contract.contract_no.clone(),
            customer_id: contract.customer_id,
            status: contract.status,
            start_date: contract.start_date,
            end_date: contract.end_date,
            terms: TermsView {
                principal: contract.principal,
                interest_rate: contract.interest_rate,
                term_months: contract.term_months,
                repayment_method: contract.repayment_method,
                monthly_payment: contract.monthly_payment,
            },
            balances: BalanceView {
                outstanding_balance: contract.outstanding_balance,
                principal_repaid: (contract.principal - contract.outstanding_balance)
                    .max(Money::ZERO),
                total_interest_paid: contract.total_interest_paid,
            },
            progress: ProgressView {
                paid_installments: schedule.len() as u32 - remaining,
                remaining_installments: remaining,
                next_due_date: next.map(|row| row.due_date),
                next_payment_amount: next.map(|row| row.total),
            },
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// application with its assessment outcome, if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationView {
    pub id: ApplicationId,
    pub application_no: String,
    pub customer_id: CustomerId,
    pub status: LoanStatus,
    pub requested_amount: Money,
    pub requested_term_months: u32,
    pub repayment_method: RepaymentMethod,
    pub existing_loan_amount: Money,
    pub purpose: String,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub assessment: Option<AssessmentView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentView {
    pub credit_score: u32,
    pub credit_grade: u8,
    pub dsr_ratio: Rate,
    pub decision: AssessmentDecision,
    pub approved_rate: Option<Rate>,
    pub rejection_reason: Option<String>,
    pub assessed_at: DateTime<Utc>,
}

impl AssessmentView {
    pub fn from_assessment(assessment: &CreditAssessment) -> Self {
        AssessmentView {
            credit_score: assessment.credit_score,
            credit_grade: assessment.credit_grade.number(),
            dsr_ratio: assessment.dsr_ratio,
            decision: assessment.decision,
            approved_rate: assessment.approved_terms.map(|t| t.rate),
            rejection_reason: assessment.rejection_reason.clone(),
            assessed_at: assessment.assessed_at,
        }
    }
}

impl ApplicationView {
    pub fn from_application(
        application: &LoanApplication,
        assessment: Option<&CreditAssessment>,
    ) -> Self {
        ApplicationView {
            id: application.id,
            application_no: application.application_no.clone(),
            customer_id: application.customer_id,
            status: application.status,
            requested_amount: application.requested_amount,
            requested_term_months: application.requested_term_months,
            repayment_method: application.repayment_method,
            existing_loan_amount: application.existing_loan_amount,
            purpose: application.purpose.clone(),
            applied_at: application.applied_at,
            created_at: application.created_at,
            assessment: assessment.map(AssessmentView::from_assessment),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// headline figures for a customer or the whole book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub customer_id: Option<CustomerId>,
    pub active_loans: u32,
    pub pending_applications: u32,
    pub total_outstanding: Money,
    pub overdue_count: u32,
    pub recent_contracts: Vec<ContractView>,
    pub recent_applications: Vec<ApplicationView>,
}

impl PortfolioSummary {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// repository-assigned identifiers
pub type CustomerId = u64;
pub type ApplicationId = u64;
pub type AssessmentId = u64;
pub type ContractId = u64;
pub type InstallmentId = u64;
pub type TransactionId = u64;

/// lifecycle status shared by applications and contracts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    /// application being written
    Draft,
    /// application submitted
    Applied,
    /// credit assessment in progress
    Reviewing,
    Approved,
    Rejected,
    /// contract created, funds disbursed
    Executed,
    /// approved application withdrawn before execution
    Cancelled,
    /// contract performing
    Active,
    /// contract fully repaid on schedule
    Completed,
    Overdue,
    Defaulted,
    /// contract paid off ahead of schedule
    EarlyRepaid,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 12] = [
        LoanStatus::Draft,
        LoanStatus::Applied,
        LoanStatus::Reviewing,
        LoanStatus::Approved,
        LoanStatus::Rejected,
        LoanStatus::Executed,
        LoanStatus::Cancelled,
        LoanStatus::Active,
        LoanStatus::Completed,
        LoanStatus::Overdue,
        LoanStatus::Defaulted,
        LoanStatus::EarlyRepaid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Draft => "DRAFT",
            LoanStatus::Applied => "APPLIED",
            LoanStatus::Reviewing => "REVIEWING",
            LoanStatus::Approved => "APPROVED",
            LoanStatus::Rejected => "REJECTED",
            LoanStatus::Executed => "EXECUTED",
            LoanStatus::Cancelled => "CANCELLED",
            LoanStatus::Active => "ACTIVE",
            LoanStatus::Completed => "COMPLETED",
            LoanStatus::Overdue => "OVERDUE",
            LoanStatus::Defaulted => "DEFAULTED",
            LoanStatus::EarlyRepaid => "EARLY_REPAID",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// borrower employment category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentType {
    Regular,
    Contract,
    SelfEmployed,
    Freelance,
    Unemployed,
}

/// repayment method for a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepaymentMethod {
    /// equal total payment every month
    Annuity,
    /// equal principal every month, interest on remaining balance
    EqualPrincipal,
    /// interest only, principal at maturity
    Bullet,
}

/// outcome of a credit assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentDecision {
    Approved,
    Rejected,
    ManualReview,
}

/// installment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    Scheduled,
    Paid,
}

/// ledger entry type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Disbursement,
    Repayment,
    EarlyRepayment,
}

/// entity kinds that carry reference codes or audit trails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Customer,
    LoanApplication,
    LoanContract,
    LoanTransaction,
}

impl EntityKind {
    /// reference code prefix
    pub fn code_prefix(&self) -> &'static str {
        match self {
            EntityKind::Customer => "CUS",
            EntityKind::LoanApplication => "APP",
            EntityKind::LoanContract => "CNT",
            EntityKind::LoanTransaction => "TXN",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Customer => "Customer",
            EntityKind::LoanApplication => "LoanApplication",
            EntityKind::LoanContract => "LoanContract",
            EntityKind::LoanTransaction => "LoanTransaction",
        };
        f.write_str(name)
    }
}

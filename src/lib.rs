pub mod assessment;
pub mod config;
pub mod contract;
pub mod decimal;
pub mod entities;
pub mod errors;
pub mod events;
pub mod lifecycle;
pub mod payments;
pub mod reference;
pub mod repository;
pub mod service;
pub mod telemetry;
pub mod types;
pub mod views;

// re-export key types
pub use assessment::{CreditAssessor, CreditGrade};
pub use config::LendingConfig;
pub use contract::ContractExecutor;
pub use decimal::{Money, Rate};
pub use entities::{
    ApprovedTerms, CreditAssessment, Customer, Installment, LoanApplication, LoanContract,
    LoanTransaction, NewApplication, NewCustomer,
};
pub use errors::{LoanError, Result};
pub use events::{Event, EventStore};
pub use lifecycle::{can_transition, validate_transition};
pub use payments::{AmortizationCalculator, AmortizationSchedule, RepaymentProcessor};
pub use reference::{DateSequenceCodes, ReferenceCodeGenerator};
pub use repository::{InMemoryRepository, LoanRepository};
pub use service::LoanService;
pub use types::{
    ApplicationId, AssessmentDecision, ContractId, CustomerId, EmploymentType, EntityKind,
    InstallmentStatus, LoanStatus, RepaymentMethod, TransactionType,
};
pub use views::{ApplicationView, ContractView, PortfolioSummary};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;

use thiserror::Error;

use crate::types::LoanStatus;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoanError {
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: String,
        id: String,
    },

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: LoanStatus,
        to: LoanStatus,
    },

    #[error("application already assessed: {application_id}")]
    AlreadyAssessed {
        application_id: u64,
    },

    #[error("invalid state: current {current}, expected {expected}")]
    InvalidState {
        current: String,
        expected: String,
    },

    #[error("no scheduled installment remaining for contract {contract_id}")]
    NoScheduledInstallment {
        contract_id: u64,
    },

    #[error("invalid input: {message}")]
    InvalidInput {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("storage failure: {message}")]
    Storage {
        message: String,
    },
}

impl LoanError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        LoanError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LoanError>;

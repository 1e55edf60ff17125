use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::types::EmploymentType;

/// lending configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LendingConfig {
    pub scoring: ScoringConfig,
    pub approval: ApprovalPolicy,
    pub dsr: DsrConfig,
}

/// synthetic credit score weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub base_score: i32,
    /// income is measured in multiples of this amount
    pub income_unit: Money,
    pub income_multiplier: Decimal,
    pub max_income_points: i32,
    pub employment_points: EmploymentPoints,
    pub min_score: i32,
    pub max_score: i32,
}

/// score adjustment per employment type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmploymentPoints {
    pub regular: i32,
    pub contract: i32,
    pub self_employed: i32,
    pub freelance: i32,
    pub unemployed: i32,
}

impl EmploymentPoints {
    pub fn points_for(&self, employment_type: EmploymentType) -> i32 {
        match employment_type {
            EmploymentType::Regular => self.regular,
            EmploymentType::Contract => self.contract,
            EmploymentType::SelfEmployed => self.self_employed,
            EmploymentType::Freelance => self.freelance,
            EmploymentType::Unemployed => self.unemployed,
        }
    }
}

/// approval thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalPolicy {
    pub min_credit_score: u32,
    /// maximum debt service ratio in percent
    pub max_dsr: Rate,
}

/// debt service ratio assumptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DsrConfig {
    /// share of an existing loan balance repaid per year
    pub existing_loan_annual_factor: Decimal,
    /// ratio reported when the borrower has no income
    pub no_income_ratio: Rate,
}

impl LendingConfig {
    /// standard retail lending policy
    pub fn standard() -> Self {
        Self {
            scoring: ScoringConfig {
                base_score: 500,
                income_unit: Money::from_major(10_000_000),
                income_multiplier: dec!(50),
                max_income_points: 300,
                employment_points: EmploymentPoints {
                    regular: 100,
                    contract: 50,
                    self_employed: 30,
                    freelance: 10,
                    unemployed: -50,
                },
                min_score: 0,
                max_score: 1000,
            },
            approval: ApprovalPolicy {
                min_credit_score: 500,
                max_dsr: Rate::from_percentage(40),
            },
            dsr: DsrConfig {
                existing_loan_annual_factor: dec!(0.12),
                no_income_ratio: Rate::from_percent(dec!(100.00)),
            },
        }
    }

    /// load from json and validate
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LendingConfig =
            serde_json::from_str(json).map_err(|e| LoanError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| LoanError::InvalidConfiguration {
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        let scoring = &self.scoring;
        if !scoring.income_unit.is_positive() {
            return Err(LoanError::InvalidConfiguration {
                message: "income unit must be positive".to_string(),
            });
        }
        if scoring.min_score < 0 || scoring.min_score > scoring.max_score {
            return Err(LoanError::InvalidConfiguration {
                message: format!(
                    "score range {}..={} is invalid",
                    scoring.min_score, scoring.max_score
                ),
            });
        }
        if scoring.max_income_points < 0 {
            return Err(LoanError::InvalidConfiguration {
                message: "max income points must not be negative".to_string(),
            });
        }
        if self.approval.max_dsr.as_percent() <= Decimal::ZERO {
            return Err(LoanError::InvalidConfiguration {
                message: "max dsr must be positive".to_string(),
            });
        }
        if self.dsr.existing_loan_annual_factor < Decimal::ZERO {
            return Err(LoanError::InvalidConfiguration {
                message: "existing loan factor must not be negative".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_config_is_valid() {
        let config = LendingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scoring.employment_points.points_for(EmploymentType::Unemployed), -50);
        assert_eq!(config.approval.min_credit_score, 500);
    }

    #[test]
    fn test_json_round_trip() {
        let config = LendingConfig::standard();
        let json = config.to_json_pretty().unwrap();
        let loaded = LendingConfig::from_json(&json).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = LendingConfig::from_json("{ \"scoring\": 1 }").unwrap_err();
        assert!(matches!(err, LoanError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_rejects_invalid_thresholds() {
        let mut config = LendingConfig::standard();
        config.approval.max_dsr = Rate::ZERO;
        assert!(config.validate().is_err());

        let mut config = LendingConfig::standard();
        config.scoring.income_unit = Money::ZERO;
        assert!(config.validate().is_err());

        let mut config = LendingConfig::standard();
        config.scoring.min_score = 1200;
        assert!(config.validate().is_err());
    }
}

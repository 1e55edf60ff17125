use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::config::{DsrConfig, ScoringConfig};
use crate::decimal::{round_half_up, Money, Rate};
use crate::types::EmploymentType;

/// synthetic credit score: base + income points + employment points, clamped
pub fn credit_score(
    config: &ScoringConfig,
    annual_income: Money,
    employment_type: EmploymentType,
) -> u32 {
    let score = config.base_score
        + income_points(config, annual_income)
        + config.employment_points.points_for(employment_type);

    score.clamp(config.min_score, config.max_score) as u32
}

/// income ratio is rounded to 2 places before the multiplier, then truncated
fn income_points(config: &ScoringConfig, annual_income: Money) -> i32 {
    if !annual_income.is_positive() {
        return 0;
    }

    let units = round_half_up(
        annual_income.as_decimal() / config.income_unit.as_decimal(),
        2,
    );
    let factor = (units * config.income_multiplier).trunc();
    let points = factor.to_i64().unwrap_or(i64::MAX);

    points.min(config.max_income_points as i64) as i32
}

/// debt service ratio in percent, 2 places
pub fn dsr_ratio(
    config: &DsrConfig,
    annual_income: Money,
    requested_amount: Money,
    requested_term_months: u32,
    existing_loan_amount: Money,
) -> Rate {
    if !annual_income.is_positive() || requested_term_months == 0 {
        return config.no_income_ratio;
    }

    let existing_annual = if existing_loan_amount.is_positive() {
        existing_loan_amount.as_decimal() * config.existing_loan_annual_factor
    } else {
        Decimal::ZERO
    };

    let monthly = round_half_up(
        requested_amount.as_decimal() / Decimal::from(requested_term_months),
        2,
    );
    let new_annual = monthly * Decimal::from(12);

    let ratio = round_half_up((existing_annual + new_annual) / annual_income.as_decimal(), 4);
    Rate::from_percent(round_half_up(ratio * Decimal::ONE_HUNDRED, 2))
}

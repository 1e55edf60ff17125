use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{round_half_up, round_significant, Money, Rate};
use crate::entities::Installment;
use crate::errors::{LoanError, Result};
use crate::types::{ContractId, InstallmentStatus, RepaymentMethod};

/// significant digits kept for the annuity growth factor and numerator
const ANNUITY_PRECISION: u32 = 20;

/// scale of intermediate products while compounding
const COMPOUND_SCALE: u32 = 24;

/// full repayment schedule with totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub contract_id: ContractId,
    pub principal: Money,
    pub interest_rate: Rate,
    pub term_months: u32,
    pub start_date: NaiveDate,
    pub repayment_method: RepaymentMethod,
    pub monthly_payment: Money,
    pub installments: Vec<Installment>,
    pub total_interest: Money,
    pub total_payment: Money,
}

impl AmortizationSchedule {
    /// generate payment schedule
    pub fn generate(
        contract_id: ContractId,
        principal: Money,
        interest_rate: Rate,
        term_months: u32,
        repayment_method: RepaymentMethod,
        start_date: NaiveDate,
    ) -> Result<Self> {
        let calculator = AmortizationCalculator::new(repayment_method);

        let monthly_payment = calculator.monthly_payment(principal, interest_rate, term_months)?;
        let installments = calculator.generate_schedule(
            contract_id,
            principal,
            interest_rate,
            term_months,
            start_date,
        )?;

        let total_interest = installments.iter().map(|i| i.interest).sum();
        let total_payment = installments.iter().map(|i| i.total).sum();

        Ok(Self {
            contract_id,
            principal,
            interest_rate,
            term_months,
            start_date,
            repayment_method,
            monthly_payment,
            installments,
            total_interest,
            total_payment,
        })
    }

    /// installment by 1-based number
    pub fn installment(&self, installment_no: u32) -> Option<&Installment> {
        installment_no
            .checked_sub(1)
            .and_then(|idx| self.installments.get(idx as usize))
    }

    /// final due date, or the start date for an empty schedule
    pub fn maturity_date(&self) -> NaiveDate {
        self.installments
            .last()
            .map(|i| i.due_date)
            .unwrap_or(self.start_date)
    }
}

/// amortization calculator
pub struct AmortizationCalculator {
    method: RepaymentMethod,
}

impl AmortizationCalculator {
    pub fn new(method: RepaymentMethod) -> Self {
        Self { method }
    }

    /// reported monthly payment for the method
    ///
    /// Equal principal reports the first month's amount, bullet reports the
    /// recurring interest. Fails with `InvalidInput` when the annuity growth
    /// factor no longer fits a decimal.
    pub fn monthly_payment(
        &self,
        principal: Money,
        annual_rate: Rate,
        term_months: u32,
    ) -> Result<Money> {
        if term_months == 0 {
            return Ok(principal);
        }

        let r = annual_rate.monthly_rate();
        match self.method {
            RepaymentMethod::Annuity => annuity_payment(principal, r, term_months),
            RepaymentMethod::EqualPrincipal => {
                Ok(principal / Decimal::from(term_months) + principal * r)
            }
            RepaymentMethod::Bullet => Ok(principal * r),
        }
    }

    /// one row per month, due dates start + i months
    pub fn generate_schedule(
        &self,
        contract_id: ContractId,
        principal: Money,
        annual_rate: Rate,
        term_months: u32,
        start_date: NaiveDate,
    ) -> Result<Vec<Installment>> {
        let r = annual_rate.monthly_rate();
        let parts = match self.method {
            RepaymentMethod::Annuity => annuity_rows(principal, r, term_months)?,
            RepaymentMethod::EqualPrincipal => equal_principal_rows(principal, r, term_months),
            RepaymentMethod::Bullet => bullet_rows(principal, r, term_months),
        };

        parts
            .into_iter()
            .enumerate()
            .map(|(idx, (principal_part, interest, balance_after))| -> Result<Installment> {
                let installment_no = idx as u32 + 1;
                Ok(Installment {
                    id: 0,
                    contract_id,
                    installment_no,
                    due_date: add_months(start_date, installment_no)?,
                    principal: principal_part,
                    interest,
                    total: principal_part + interest,
                    balance_after,
                    status: InstallmentStatus::Scheduled,
                    paid_date: None,
                    paid_amount: None,
                })
            })
            .collect()
    }
}

/// P * r * (1+r)^n / ((1+r)^n - 1), or P / n without interest
fn annuity_payment(principal: Money, r: Decimal, months: u32) -> Result<Money> {
    if r.is_zero() {
        return Ok(principal / Decimal::from(months));
    }

    let overflow = || LoanError::InvalidInput {
        message: format!(
            "annuity growth factor out of range: {} months at monthly rate {}",
            months, r
        ),
    };

    let base = Decimal::ONE + r;
    let mut growth = Decimal::ONE;
    for _ in 0..months {
        growth = round_half_up(growth.checked_mul(base).ok_or_else(overflow)?, COMPOUND_SCALE);
    }
    let growth = round_significant(growth, ANNUITY_PRECISION);

    let scaled = round_significant(principal.as_decimal() * r, ANNUITY_PRECISION);
    let numerator = round_significant(
        scaled.checked_mul(growth).ok_or_else(overflow)?,
        ANNUITY_PRECISION,
    );

    Ok(Money::from_decimal(numerator / (growth - Decimal::ONE)))
}

// rows are (principal, interest, balance after)

fn annuity_rows(principal: Money, r: Decimal, months: u32) -> Result<Vec<(Money, Money, Money)>> {
    if months == 0 {
        return Ok(Vec::new());
    }

    let payment = annuity_payment(principal, r, months)?;
    let mut balance = principal;
    let mut rows = Vec::with_capacity(months as usize);

    for no in 1..=months {
        let interest = balance * r;
        // final row absorbs the rounding drift
        let principal_part = if no == months {
            balance
        } else {
            (payment - interest).max(Money::ZERO).min(balance)
        };
        balance = (balance - principal_part).max(Money::ZERO);
        rows.push((principal_part, interest, balance));
    }

    Ok(rows)
}

fn equal_principal_rows(principal: Money, r: Decimal, months: u32) -> Vec<(Money, Money, Money)> {
    if months == 0 {
        return Vec::new();
    }

    let share = principal / Decimal::from(months);
    let mut balance = principal;
    let mut rows = Vec::with_capacity(months as usize);

    for no in 1..=months {
        let interest = balance * r;
        let principal_part = if no == months {
            balance
        } else {
            share.min(balance)
        };
        balance = (balance - principal_part).max(Money::ZERO);
        rows.push((principal_part, interest, balance));
    }

    rows
}

fn bullet_rows(principal: Money, r: Decimal, months: u32) -> Vec<(Money, Money, Money)> {
    let interest = principal * r;
    (1..=months)
        .map(|no| {
            if no == months {
                (principal, interest, Money::ZERO)
            } else {
                (Money::ZERO, interest, principal)
            }
        })
        .collect()
}

/// calendar month offset, clamped to the end of shorter months
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| LoanError::InvalidInput {
            message: format!("due date out of range: {} + {} months", date, months),
        })
}

pub mod amortization;
pub mod repayment;

pub use amortization::{add_months, AmortizationCalculator, AmortizationSchedule};
pub use repayment::RepaymentProcessor;

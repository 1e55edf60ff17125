/// loan lifecycle - application through assessment, execution and repayment
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use loan_lifecycle_rs::{
    telemetry, EmploymentType, InMemoryRepository, LoanService, Money, NewApplication,
    NewCustomer, RepaymentMethod, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init("info")?;
    println!("=== loan lifecycle ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap(),
    ));
    let mut service = LoanService::new(InMemoryRepository::new(), time);

    // 1. intake
    println!("1. intake");
    println!("---------");
    let customer = service.register_customer(NewCustomer {
        name: "Kim Minsu".to_string(),
        email: "minsu@example.com".to_string(),
        phone: "010-1234-5678".to_string(),
        annual_income: Money::from_major(60_000_000),
        employment_type: EmploymentType::Regular,
        company: Some("Hanbit Systems".to_string()),
        birth_date: NaiveDate::from_ymd_opt(1990, 5, 15).unwrap(),
    })?;
    println!("  customer: {} ({})", customer.customer_no, customer.name);

    let application = service.create_application(NewApplication {
        customer_id: customer.id,
        requested_amount: Money::from_major(12_000_000),
        requested_term_months: 12,
        repayment_method: RepaymentMethod::Annuity,
        existing_loan_amount: None,
        purpose: "car purchase".to_string(),
    })?;
    let application = service.submit_application(application.id)?;
    println!("  application: {} status {}", application.application_no, application.status);

    // 2. assessment
    println!("\n2. assessment");
    println!("-------------");
    let assessment = service.assess_application(application.id)?;
    println!("  score: {} grade: {}", assessment.credit_score, assessment.credit_grade.number());
    println!("  dsr: {}", assessment.dsr_ratio);
    println!("  decision: {:?}", assessment.decision);

    // 3. execution
    println!("\n3. execution");
    println!("------------");
    let contract = service.execute_loan(application.id)?;
    println!("  contract: {} rate {}", contract.contract_no, contract.interest_rate);
    println!("  monthly payment: {}", contract.monthly_payment);
    for row in service.schedule(contract.id)?.iter().take(3) {
        println!(
            "    #{:>2} {} principal {:>12} interest {:>10} balance {:>12}",
            row.installment_no, row.due_date, row.principal, row.interest, row.balance_after
        );
    }

    // 4. servicing
    println!("\n4. servicing");
    println!("------------");
    for _ in 0..3 {
        service.time().test_control().unwrap().advance(Duration::days(31));
        let due = service
            .schedule(contract.id)?
            .into_iter()
            .find(|row| row.is_scheduled())
            .ok_or("schedule exhausted")?;
        let txn = service.repay(contract.id, due.total)?;
        println!("  {} paid {} balance {}", txn.transaction_no, txn.amount, txn.balance_after);
    }

    // 5. early repayment
    println!("\n5. early repayment");
    println!("------------------");
    let txn = service.early_repay(contract.id)?;
    println!("  {} settled {}", txn.transaction_no, txn.amount);
    println!("{}", service.contract_view(contract.id)?.to_json_pretty()?);

    let summary = service.portfolio_summary(Some(customer.id))?;
    println!(
        "\nactive loans: {} outstanding: {} events: {}",
        summary.active_loans,
        summary.total_outstanding,
        service.events().len()
    );

    Ok(())
}

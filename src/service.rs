use hourglass_rs::SafeTimeProvider;
use tracing::info;

use crate::assessment::CreditAssessor;
use crate::config::LendingConfig;
use crate::contract::ContractExecutor;
use crate::decimal::Money;
use crate::entities::{
    CreditAssessment, Customer, Installment, LoanApplication, LoanContract, LoanTransaction,
    NewApplication, NewCustomer,
};
use crate::errors::{LoanError, Result};
use crate::events::{Event, EventStore};
use crate::lifecycle::validate_transition;
use crate::payments::RepaymentProcessor;
use crate::reference::{DateSequenceCodes, ReferenceCodeGenerator};
use crate::repository::LoanRepository;
use crate::types::{ApplicationId, ContractId, CustomerId, EntityKind, LoanStatus};
use crate::views::{ApplicationView, ContractView, PortfolioSummary};

/// number of entries in each recent list of a portfolio summary
const RECENT_LIMIT: usize = 5;

/// Entry point for the loan lifecycle.
///
/// Every mutating call runs in one repository unit of work. Events raised
/// during the call are published to [`LoanService::events`] only if the unit
/// commits. Published events stay buffered for the life of the service;
/// long-running callers must drain them with [`LoanService::take_events`],
/// and [`LoanService::status_trail`] only sees events not yet drained.
pub struct LoanService<R: LoanRepository, G: ReferenceCodeGenerator = DateSequenceCodes> {
    repository: R,
    codes: G,
    time: SafeTimeProvider,
    config: LendingConfig,
    events: EventStore,
}

impl<R: LoanRepository> LoanService<R, DateSequenceCodes> {
    /// service with the standard lending policy and date-sequence codes
    pub fn new(repository: R, time: SafeTimeProvider) -> Self {
        Self {
            repository,
            codes: DateSequenceCodes::new(),
            time,
            config: LendingConfig::standard(),
            events: EventStore::new(),
        }
    }
}

impl<R: LoanRepository, G: ReferenceCodeGenerator> LoanService<R, G> {
    pub fn with_parts(
        repository: R,
        codes: G,
        time: SafeTimeProvider,
        config: LendingConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            repository,
            codes,
            time,
            config,
            events: EventStore::new(),
        })
    }

    pub fn config(&self) -> &LendingConfig {
        &self.config
    }

    pub fn time(&self) -> &SafeTimeProvider {
        &self.time
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// published events, oldest first
    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    pub fn status_trail(
        &self,
        entity: EntityKind,
        entity_id: u64,
    ) -> Vec<(Option<LoanStatus>, LoanStatus)> {
        self.events.status_trail(entity, entity_id)
    }

    /// run `work` in a unit of work, publishing its events on commit
    fn run<T, F>(&mut self, work: F) -> Result<T>
    where
        F: FnOnce(&mut R, &mut G, &SafeTimeProvider, &LendingConfig, &mut EventStore) -> Result<T>,
    {
        let Self {
            repository,
            codes,
            time,
            config,
            events,
        } = self;

        let mut staged = EventStore::new();
        let value =
            repository.unit_of_work(|repo| work(repo, codes, time, config, &mut staged))?;
        events.absorb(&mut staged);
        Ok(value)
    }

    // intake

    pub fn register_customer(&mut self, input: NewCustomer) -> Result<Customer> {
        if input.name.trim().is_empty() {
            return Err(LoanError::InvalidInput {
                message: "customer name must not be empty".to_string(),
            });
        }
        if input.annual_income.is_negative() {
            return Err(LoanError::InvalidInput {
                message: format!("annual income must not be negative: {}", input.annual_income),
            });
        }

        self.run(|repo, codes, time, _, events| {
            let now = time.now();
            let mut customer = Customer {
                id: 0,
                customer_no: codes.next_code(EntityKind::Customer, now),
                name: input.name,
                email: input.email,
                phone: input.phone,
                annual_income: input.annual_income,
                employment_type: input.employment_type,
                company: input.company,
                birth_date: input.birth_date,
                created_at: now,
            };
            customer.id = repo.insert_customer(customer.clone())?;

            events.emit(Event::CustomerRegistered {
                customer_id: customer.id,
                customer_no: customer.customer_no.clone(),
                timestamp: now,
            });
            info!(customer_id = customer.id, customer_no = %customer.customer_no, "customer registered");
            Ok(customer)
        })
    }

    pub fn create_application(&mut self, input: NewApplication) -> Result<LoanApplication> {
        if !input.requested_amount.is_positive() {
            return Err(LoanError::InvalidInput {
                message: format!("requested amount must be positive: {}", input.requested_amount),
            });
        }
        if input.requested_term_months == 0 {
            return Err(LoanError::InvalidInput {
                message: "requested term must be at least one month".to_string(),
            });
        }
        let existing_loan_amount = input.existing_loan_amount.unwrap_or(Money::ZERO);
        if existing_loan_amount.is_negative() {
            return Err(LoanError::InvalidInput {
                message: format!("existing loan amount must not be negative: {}", existing_loan_amount),
            });
        }

        self.run(|repo, codes, time, _, events| {
            repo.find_customer(input.customer_id)?
                .ok_or_else(|| LoanError::not_found("Customer", input.customer_id))?;

            let now = time.now();
            let mut application = LoanApplication {
                id: 0,
                application_no: codes.next_code(EntityKind::LoanApplication, now),
                customer_id: input.customer_id,
                requested_amount: input.requested_amount,
                requested_term_months: input.requested_term_months,
                repayment_method: input.repayment_method,
                existing_loan_amount,
                purpose: input.purpose,
                status: LoanStatus::Draft,
                applied_at: None,
                created_at: now,
            };
            application.id = repo.insert_application(application.clone())?;

            events.emit(Event::status_changed(
                EntityKind::LoanApplication,
                application.id,
                None,
                LoanStatus::Draft,
                "application created",
                now,
            ));
            events.emit(Event::ApplicationCreated {
                application_id: application.id,
                application_no: application.application_no.clone(),
                customer_id: application.customer_id,
                requested_amount: application.requested_amount,
                timestamp: now,
            });
            info!(
                application_id = application.id,
                application_no = %application.application_no,
                amount = %application.requested_amount,
                "application created"
            );
            Ok(application)
        })
    }

    pub fn submit_application(&mut self, application_id: ApplicationId) -> Result<LoanApplication> {
        self.run(|repo, _, time, _, events| {
            let current = repo
                .find_application(application_id)?
                .ok_or_else(|| LoanError::not_found("LoanApplication", application_id))?;
            validate_transition(current.status, LoanStatus::Applied)?;

            let now = time.now();
            let application = LoanApplication {
                status: LoanStatus::Applied,
                applied_at: Some(now),
                ..current.clone()
            };
            repo.update_application(&application)?;

            events.emit(Event::status_changed(
                EntityKind::LoanApplication,
                application_id,
                Some(current.status),
                LoanStatus::Applied,
                "application submitted",
                now,
            ));
            info!(application_id, "application submitted");
            Ok(application)
        })
    }

    pub fn cancel_application(&mut self, application_id: ApplicationId) -> Result<LoanApplication> {
        self.run(|repo, _, time, _, events| {
            let current = repo
                .find_application(application_id)?
                .ok_or_else(|| LoanError::not_found("LoanApplication", application_id))?;
            validate_transition(current.status, LoanStatus::Cancelled)?;

            repo.update_application_status(application_id, LoanStatus::Cancelled)?;
            events.emit(Event::status_changed(
                EntityKind::LoanApplication,
                application_id,
                Some(current.status),
                LoanStatus::Cancelled,
                "application cancelled",
                time.now(),
            ));
            info!(application_id, "application cancelled");
            Ok(current.with_status(LoanStatus::Cancelled))
        })
    }

    // lifecycle

    pub fn assess_application(&mut self, application_id: ApplicationId) -> Result<CreditAssessment> {
        self.run(|repo, _, time, config, events| {
            CreditAssessor::new(config).assess(repo, application_id, time, events)
        })
    }

    pub fn execute_loan(&mut self, application_id: ApplicationId) -> Result<LoanContract> {
        self.run(|repo, codes, time, _, events| {
            ContractExecutor::new().execute(repo, codes, application_id, time, events)
        })
    }

    pub fn repay(&mut self, contract_id: ContractId, amount: Money) -> Result<LoanTransaction> {
        self.run(|repo, codes, time, _, events| {
            RepaymentProcessor::new().repay(repo, codes, contract_id, amount, time, events)
        })
    }

    pub fn early_repay(&mut self, contract_id: ContractId) -> Result<LoanTransaction> {
        self.run(|repo, codes, time, _, events| {
            RepaymentProcessor::new().early_repay(repo, codes, contract_id, time, events)
        })
    }

    // queries

    pub fn customer(&self, customer_id: CustomerId) -> Result<Customer> {
        self.repository
            .find_customer(customer_id)?
            .ok_or_else(|| LoanError::not_found("Customer", customer_id))
    }

    pub fn customers(&self) -> Result<Vec<Customer>> {
        self.repository.find_all_customers()
    }

    pub fn applications(&self) -> Result<Vec<LoanApplication>> {
        self.repository.find_all_applications()
    }

    pub fn contracts(&self) -> Result<Vec<LoanContract>> {
        self.repository.find_all_contracts()
    }

    pub fn application(&self, application_id: ApplicationId) -> Result<LoanApplication> {
        self.repository
            .find_application(application_id)?
            .ok_or_else(|| LoanError::not_found("LoanApplication", application_id))
    }

    pub fn applications_for_customer(&self, customer_id: CustomerId) -> Result<Vec<LoanApplication>> {
        self.repository.find_applications_by_customer(customer_id)
    }

    pub fn assessment_for_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<CreditAssessment> {
        self.repository
            .find_assessment_by_application(application_id)?
            .ok_or_else(|| LoanError::not_found("CreditAssessment", application_id))
    }

    pub fn contract(&self, contract_id: ContractId) -> Result<LoanContract> {
        self.repository
            .find_contract(contract_id)?
            .ok_or_else(|| LoanError::not_found("LoanContract", contract_id))
    }

    pub fn contracts_for_customer(&self, customer_id: CustomerId) -> Result<Vec<LoanContract>> {
        self.repository.find_contracts_by_customer(customer_id)
    }

    pub fn schedule(&self, contract_id: ContractId) -> Result<Vec<Installment>> {
        self.contract(contract_id)?;
        self.repository.find_installments(contract_id)
    }

    pub fn transactions(&self, contract_id: ContractId) -> Result<Vec<LoanTransaction>> {
        self.contract(contract_id)?;
        self.repository.find_transactions(contract_id)
    }

    pub fn contract_view(&self, contract_id: ContractId) -> Result<ContractView> {
        let contract = self.contract(contract_id)?;
        let schedule = self.repository.find_installments(contract_id)?;
        Ok(ContractView::from_contract(&contract, &schedule))
    }

    pub fn application_view(&self, application_id: ApplicationId) -> Result<ApplicationView> {
        let application = self.application(application_id)?;
        let assessment = self.repository.find_assessment_by_application(application_id)?;
        Ok(ApplicationView::from_application(&application, assessment.as_ref()))
    }

    /// book-level figures, optionally narrowed to one customer
    pub fn portfolio_summary(&self, customer_id: Option<CustomerId>) -> Result<PortfolioSummary> {
        let (mut contracts, mut applications) = match customer_id {
            Some(id) => (
                self.repository.find_contracts_by_customer(id)?,
                self.repository.find_applications_by_customer(id)?,
            ),
            None => (
                self.repository.find_all_contracts()?,
                self.repository.find_all_applications()?,
            ),
        };

        let active_loans = contracts
            .iter()
            .filter(|c| c.status == LoanStatus::Active)
            .count() as u32;
        let overdue_count = contracts
            .iter()
            .filter(|c| c.status == LoanStatus::Overdue)
            .count() as u32;
        let pending_applications = applications.iter().filter(|a| a.is_pending()).count() as u32;
        let total_outstanding: Money = contracts.iter().map(|c| c.outstanding_balance).sum();

        // newest first, ids break ties
        contracts.sort_by(|a, b| b.executed_at.cmp(&a.executed_at).then(b.id.cmp(&a.id)));
        applications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let recent_contracts = contracts
            .iter()
            .take(RECENT_LIMIT)
            .map(|c| {
                let schedule = self.repository.find_installments(c.id)?;
                Ok(ContractView::from_contract(c, &schedule))
            })
            .collect::<Result<Vec<_>>>()?;
        let recent_applications = applications
            .iter()
            .take(RECENT_LIMIT)
            .map(|a| {
                let assessment = self.repository.find_assessment_by_application(a.id)?;
                Ok(ApplicationView::from_application(a, assessment.as_ref()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PortfolioSummary {
            customer_id,
            active_loans,
            pending_applications,
            total_outstanding,
            overdue_count,
            recent_contracts,
            recent_applications,
        })
    }
}

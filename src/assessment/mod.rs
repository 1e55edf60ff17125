pub mod grade;
pub mod scoring;

use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use tracing::{info, warn};

use crate::config::LendingConfig;
use crate::entities::{ApprovedTerms, CreditAssessment, Customer, LoanApplication};
use crate::errors::{LoanError, Result};
use crate::events::{Event, EventStore};
use crate::lifecycle::validate_transition;
use crate::repository::LoanRepository;
use crate::types::{ApplicationId, AssessmentDecision, EntityKind, LoanStatus};

pub use grade::CreditGrade;
pub use scoring::{credit_score, dsr_ratio};

/// credit assessor
pub struct CreditAssessor {
    config: LendingConfig,
}

impl CreditAssessor {
    pub fn new(config: &LendingConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// pure evaluation of an application; the result is not yet persisted
    pub fn evaluate(
        &self,
        application: &LoanApplication,
        customer: &Customer,
        assessed_at: DateTime<Utc>,
    ) -> CreditAssessment {
        let score = credit_score(
            &self.config.scoring,
            customer.annual_income,
            customer.employment_type,
        );
        let grade = CreditGrade::from_score(score);
        let dsr = dsr_ratio(
            &self.config.dsr,
            customer.annual_income,
            application.requested_amount,
            application.requested_term_months,
            application.existing_loan_amount,
        );

        let policy = &self.config.approval;
        let mut reasons = Vec::new();
        if score < policy.min_credit_score {
            reasons.push(format!(
                "credit score insufficient (current: {}, minimum: {})",
                score, policy.min_credit_score
            ));
        }
        if dsr > policy.max_dsr {
            reasons.push(format!(
                "DSR exceeded (current: {}, maximum: {})",
                dsr, policy.max_dsr
            ));
        }

        let (decision, approved_terms, rejection_reason) = if reasons.is_empty() {
            let terms = ApprovedTerms {
                rate: grade.base_rate(),
                amount: application.requested_amount,
                term_months: application.requested_term_months,
            };
            (AssessmentDecision::Approved, Some(terms), None)
        } else {
            (AssessmentDecision::Rejected, None, Some(reasons.join("; ")))
        };

        CreditAssessment {
            id: 0,
            application_id: application.id,
            credit_score: score,
            credit_grade: grade,
            dsr_ratio: dsr,
            decision,
            approved_terms,
            rejection_reason,
            assessed_at,
        }
    }

    /// assess a submitted application and move it to APPROVED or REJECTED
    pub fn assess<R: LoanRepository>(
        &self,
        repository: &mut R,
        application_id: ApplicationId,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<CreditAssessment> {
        let application = repository
            .find_application(application_id)?
            .ok_or_else(|| LoanError::not_found("LoanApplication", application_id))?;

        if repository
            .find_assessment_by_application(application_id)?
            .is_some()
        {
            return Err(LoanError::AlreadyAssessed { application_id });
        }

        validate_transition(application.status, LoanStatus::Reviewing)?;

        let customer = repository
            .find_customer(application.customer_id)?
            .ok_or_else(|| LoanError::not_found("Customer", application.customer_id))?;

        let now = time_provider.now();
        repository.update_application_status(application_id, LoanStatus::Reviewing)?;
        events.emit(Event::status_changed(
            EntityKind::LoanApplication,
            application_id,
            Some(application.status),
            LoanStatus::Reviewing,
            "assessment started",
            now,
        ));

        let mut assessment = self.evaluate(&application, &customer, now);
        assessment.id = repository.insert_assessment(assessment.clone())?;

        let (new_status, reason) = match assessment.decision {
            AssessmentDecision::Approved => (LoanStatus::Approved, "assessment approved".to_string()),
            _ => (
                LoanStatus::Rejected,
                format!(
                    "assessment rejected: {}",
                    assessment.rejection_reason.as_deref().unwrap_or_default()
                ),
            ),
        };
        validate_transition(LoanStatus::Reviewing, new_status)?;
        repository.update_application_status(application_id, new_status)?;
        events.emit(Event::status_changed(
            EntityKind::LoanApplication,
            application_id,
            Some(LoanStatus::Reviewing),
            new_status,
            reason,
            now,
        ));

        events.emit(Event::AssessmentCompleted {
            application_id,
            credit_score: assessment.credit_score,
            credit_grade: assessment.credit_grade,
            dsr_ratio: assessment.dsr_ratio,
            decision: assessment.decision,
            timestamp: now,
        });

        match assessment.decision {
            AssessmentDecision::Approved => info!(
                application_id,
                score = assessment.credit_score,
                dsr = %assessment.dsr_ratio,
                "credit assessment approved"
            ),
            _ => warn!(
                application_id,
                score = assessment.credit_score,
                reason = assessment.rejection_reason.as_deref().unwrap_or_default(),
                "credit assessment rejected"
            ),
        }

        Ok(assessment)
    }
}

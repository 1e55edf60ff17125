use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assessment::CreditGrade;
use crate::decimal::{Money, Rate};
use crate::types::{
    ApplicationId, AssessmentDecision, ContractId, CustomerId, EntityKind, LoanStatus,
};

/// all events emitted by lifecycle operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // audit trail
    StatusChanged {
        audit_id: Uuid,
        entity: EntityKind,
        entity_id: u64,
        /// none when the entity is created
        old_status: Option<LoanStatus>,
        new_status: LoanStatus,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    // intake events
    CustomerRegistered {
        customer_id: CustomerId,
        customer_no: String,
        timestamp: DateTime<Utc>,
    },
    ApplicationCreated {
        application_id: ApplicationId,
        application_no: String,
        customer_id: CustomerId,
        requested_amount: Money,
        timestamp: DateTime<Utc>,
    },

    // assessment events
    AssessmentCompleted {
        application_id: ApplicationId,
        credit_score: u32,
        credit_grade: CreditGrade,
        dsr_ratio: Rate,
        decision: AssessmentDecision,
        timestamp: DateTime<Utc>,
    },

    // contract events
    LoanDisbursed {
        contract_id: ContractId,
        contract_no: String,
        principal: Money,
        monthly_payment: Money,
        timestamp: DateTime<Utc>,
    },

    // repayment events
    RepaymentApplied {
        contract_id: ContractId,
        installment_no: u32,
        amount: Money,
        principal_portion: Money,
        interest_portion: Money,
        balance_after: Money,
        timestamp: DateTime<Utc>,
    },
    EarlyRepaymentApplied {
        contract_id: ContractId,
        amount: Money,
        installments_settled: u32,
        interest_settled: Money,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    /// audit entry for a status change
    pub fn status_changed(
        entity: EntityKind,
        entity_id: u64,
        old_status: Option<LoanStatus>,
        new_status: LoanStatus,
        reason: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Event::StatusChanged {
            audit_id: Uuid::new_v4(),
            entity,
            entity_id,
            old_status,
            new_status,
            reason: reason.into(),
            timestamp,
        }
    }
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// move every event out of `other`
    pub fn absorb(&mut self, other: &mut EventStore) {
        self.events.append(&mut other.events);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// status changes recorded for one entity, oldest first
    pub fn status_trail(&self, entity: EntityKind, entity_id: u64) -> Vec<(Option<LoanStatus>, LoanStatus)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::StatusChanged {
                    entity: e,
                    entity_id: id,
                    old_status,
                    new_status,
                    ..
                } if *e == entity && *id == entity_id => Some((*old_status, *new_status)),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_trail_filters_by_entity() {
        let now = Utc::now();
        let mut store = EventStore::new();
        store.emit(Event::status_changed(
            EntityKind::LoanApplication,
            1,
            None,
            LoanStatus::Draft,
            "created",
            now,
        ));
        store.emit(Event::status_changed(
            EntityKind::LoanContract,
            1,
            None,
            LoanStatus::Executed,
            "executed",
            now,
        ));
        store.emit(Event::status_changed(
            EntityKind::LoanApplication,
            1,
            Some(LoanStatus::Draft),
            LoanStatus::Applied,
            "submitted",
            now,
        ));

        assert_eq!(
            store.status_trail(EntityKind::LoanApplication, 1),
            vec![
                (None, LoanStatus::Draft),
                (Some(LoanStatus::Draft), LoanStatus::Applied)
            ]
        );
        assert_eq!(store.status_trail(EntityKind::LoanApplication, 2), vec![]);
    }

    #[test]
    fn test_absorb_moves_events() {
        let mut staged = EventStore::new();
        staged.emit(Event::CustomerRegistered {
            customer_id: 1,
            customer_no: "CUS202601010001".to_string(),
            timestamp: Utc::now(),
        });

        let mut published = EventStore::new();
        published.absorb(&mut staged);

        assert!(staged.events().is_empty());
        assert_eq!(published.events().len(), 1);
        assert_eq!(published.take_events().len(), 1);
        assert!(published.events().is_empty());
    }
}

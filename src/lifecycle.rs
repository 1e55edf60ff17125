use crate::errors::{LoanError, Result};
use crate::types::LoanStatus;

/// whether `current -> target` is an edge of the lifecycle graph
pub fn can_transition(current: LoanStatus, target: LoanStatus) -> bool {
    use LoanStatus::*;

    matches!(
        (current, target),
        (Draft, Applied)
            | (Applied, Reviewing)
            | (Reviewing, Approved)
            | (Reviewing, Rejected)
            | (Approved, Executed)
            | (Approved, Cancelled)
            | (Executed, Active)
            | (Active, Completed)
            | (Active, Overdue)
            | (Active, EarlyRepaid)
            | (Overdue, Active)
            | (Overdue, Defaulted)
    )
}

/// fail with `InvalidTransition` unless the edge exists
pub fn validate_transition(current: LoanStatus, target: LoanStatus) -> Result<()> {
    if can_transition(current, target) {
        Ok(())
    } else {
        Err(LoanError::InvalidTransition {
            from: current,
            to: target,
        })
    }
}

/// a status with no outgoing edges
pub fn is_terminal(status: LoanStatus) -> bool {
    LoanStatus::ALL
        .iter()
        .all(|target| !can_transition(status, *target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use LoanStatus::*;

    const EDGES: [(LoanStatus, LoanStatus); 12] = [
        (Draft, Applied),
        (Applied, Reviewing),
        (Reviewing, Approved),
        (Reviewing, Rejected),
        (Approved, Executed),
        (Approved, Cancelled),
        (Executed, Active),
        (Active, Completed),
        (Active, Overdue),
        (Active, EarlyRepaid),
        (Overdue, Active),
        (Overdue, Defaulted),
    ];

    #[test]
    fn test_graph_matches_edge_list_exactly() {
        for from in LoanStatus::ALL {
            for to in LoanStatus::ALL {
                let expected = EDGES.contains(&(from, to));
                assert_eq!(
                    can_transition(from, to),
                    expected,
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_terminal_states() {
        for status in [Rejected, Cancelled, Completed, Defaulted, EarlyRepaid] {
            assert!(is_terminal(status), "{} should be terminal", status);
            for target in LoanStatus::ALL {
                assert!(!can_transition(status, target));
            }
        }

        for status in [Draft, Applied, Reviewing, Approved, Executed, Active, Overdue] {
            assert!(!is_terminal(status));
        }
    }

    #[test]
    fn test_no_self_transitions() {
        for status in LoanStatus::ALL {
            assert!(!can_transition(status, status));
        }
    }

    #[test]
    fn test_validate_transition_reports_both_ends() {
        assert!(validate_transition(Approved, Executed).is_ok());

        let err = validate_transition(Draft, Executed).unwrap_err();
        assert_eq!(
            err,
            LoanError::InvalidTransition {
                from: Draft,
                to: Executed,
            }
        );
        assert_eq!(err.to_string(), "invalid status transition: DRAFT -> EXECUTED");
    }
}

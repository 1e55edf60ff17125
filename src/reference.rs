use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::types::EntityKind;

/// source of human-readable reference codes
pub trait ReferenceCodeGenerator {
    /// next code for `kind`; never repeats within one generator
    fn next_code(&mut self, kind: EntityKind, now: DateTime<Utc>) -> String;
}

/// `PREFIX + yyyymmdd + sequence`, one running sequence per entity kind
///
/// Sequences keep counting across days, so a code is unique even when the
/// padded width overflows.
#[derive(Debug, Clone, Default)]
pub struct DateSequenceCodes {
    sequences: HashMap<EntityKind, u64>,
}

impl DateSequenceCodes {
    pub fn new() -> Self {
        Self::default()
    }

    fn width(kind: EntityKind) -> usize {
        match kind {
            EntityKind::LoanTransaction => 6,
            _ => 4,
        }
    }
}

impl ReferenceCodeGenerator for DateSequenceCodes {
    fn next_code(&mut self, kind: EntityKind, now: DateTime<Utc>) -> String {
        let seq = self.sequences.entry(kind).or_insert(0);
        *seq += 1;

        format!(
            "{}{}{:0width$}",
            kind.code_prefix(),
            now.format("%Y%m%d"),
            seq,
            width = Self::width(kind)
        )
    }
}

//! Entry-criteria gate evaluation.
//!
//! Pure functions over a slice of a phase's criteria. A phase with zero
//! mandatory criteria is vacuously satisfied and never blocks approval.

use serde::{Deserialize, Serialize};

use crate::types::EntryCriterion;

/// The result of evaluating a phase's entry-criteria gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateStatus {
    /// True when every mandatory criterion is completed (or none exist).
    pub satisfied: bool,

    /// Completed mandatory criteria.
    pub completed: usize,

    /// Total mandatory criteria.
    pub mandatory: usize,
}

/// Evaluates the gate for one phase's criteria.
///
/// Only mandatory criteria count; optional ones are informational.
pub fn evaluate(criteria: &[EntryCriterion]) -> GateStatus {
    let mandatory = criteria.iter().filter(|c| c.is_mandatory).count();
    let completed = criteria
        .iter()
        .filter(|c| c.is_mandatory && c.is_completed)
        .count();

    GateStatus {
        satisfied: completed == mandatory,
        completed,
        mandatory,
    }
}

//! The project record.

use serde::{Deserialize, Serialize};

use super::ids::{PhaseKey, ProjectId};

/// A project moving through the delivery workflow.
///
/// `current_phase` is derived state: the state machine recomputes it from
/// the completed-phase set on every transition. Nothing else writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,

    /// The phase the project is currently in (lowest-ordinal phase that is
    /// not yet completed, or the phase just started).
    pub current_phase: PhaseKey,
}

impl Project {
    pub fn new(id: ProjectId, current_phase: PhaseKey) -> Self {
        Project { id, current_phase }
    }
}

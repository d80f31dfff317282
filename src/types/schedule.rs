//! Schedule phases and their dependency declarations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::{PhaseKey, ProjectId};

/// The scheduling status of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    /// On track against its stored dates.
    Scheduled,

    /// A recalculation pushed its end date past the previously stored one.
    Delayed,

    /// Work for this phase is done; dates may still shift but the status
    /// is preserved.
    Completed,
}

impl ScheduleStatus {
    /// Returns the name of this status for logging/display.
    pub fn name(&self) -> &'static str {
        match self {
            ScheduleStatus::Scheduled => "scheduled",
            ScheduleStatus::Delayed => "delayed",
            ScheduleStatus::Completed => "completed",
        }
    }
}

/// One dated phase of a project's schedule.
///
/// INVARIANT: for any phase with dependencies, `start_date` is the first
/// business day after the latest `end_date` among its dependencies, and
/// `end_date` spans `duration_days` (inclusive) from the start. The
/// recalculation engine restores this after every edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePhase {
    pub project_id: ProjectId,
    pub phase_key: PhaseKey,

    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    /// Inclusive span between start and end. Preserved when a recalculation
    /// slides the phase; re-derived only when the phase's own end is edited.
    pub duration_days: u32,

    /// Phase keys this phase depends on, within the same project.
    /// The per-project graph these edges form must be acyclic.
    pub depends_on: Vec<PhaseKey>,

    pub responsible_email: Option<String>,

    pub status: ScheduleStatus,

    /// Optimistic-concurrency version. Incremented by the store on every
    /// write; writes carrying a stale version are rejected.
    pub version: u64,
}

impl SchedulePhase {
    pub fn new(
        project_id: ProjectId,
        phase_key: PhaseKey,
        start_date: NaiveDate,
        end_date: NaiveDate,
        depends_on: Vec<PhaseKey>,
    ) -> Self {
        let duration_days = span_days(start_date, end_date);
        SchedulePhase {
            project_id,
            phase_key,
            start_date,
            end_date,
            duration_days,
            depends_on,
            responsible_email: None,
            status: ScheduleStatus::Scheduled,
            version: 0,
        }
    }
}

/// Inclusive day span between two dates. A phase starting and ending on the
/// same day has a duration of 1.
pub fn span_days(start: NaiveDate, end: NaiveDate) -> u32 {
    (end - start).num_days().max(0) as u32 + 1
}

//! Workflow phase instance state.
//!
//! A `WorkflowPhaseInstance` is created lazily when a phase is first started
//! and only ever moves forward: `pending -> in_progress -> completed`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{PhaseKey, ProjectId};

/// The status of a workflow phase instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    /// Not yet started.
    Pending,

    /// Started and awaiting approval.
    InProgress,

    /// Approved. Terminal; no transition leaves this state.
    Completed,
}

impl PhaseStatus {
    /// Returns the name of this status for logging/display.
    pub fn name(&self) -> &'static str {
        match self {
            PhaseStatus::Pending => "pending",
            PhaseStatus::InProgress => "in_progress",
            PhaseStatus::Completed => "completed",
        }
    }

    /// Returns true if no further transitions are allowed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PhaseStatus::Completed)
    }
}

/// One phase of one project's delivery workflow.
///
/// `(project_id, phase_key)` is unique. Status transitions are monotonic;
/// the mutators below are the only way the record changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowPhaseInstance {
    pub project_id: ProjectId,
    pub phase_key: PhaseKey,

    pub status: PhaseStatus,

    /// Stamped when the phase enters `in_progress`. Re-stamped if the phase
    /// is re-affirmed while already in progress.
    pub started_at: Option<DateTime<Utc>>,

    /// Stamped when the phase is approved.
    pub completed_at: Option<DateTime<Utc>>,

    /// Identity that completed the phase.
    pub completed_by: Option<String>,

    /// Identity that approved the phase (same as `completed_by` today; kept
    /// separate because the original data model records both).
    pub approved_by: Option<String>,

    /// Free-form notes supplied with the approval.
    pub approval_notes: Option<String>,

    /// Snapshot of the entry-criteria gate at approval time.
    pub entry_criteria_completed: bool,
}

impl WorkflowPhaseInstance {
    /// Creates a pending instance for a phase that has not been touched yet.
    pub fn new(project_id: ProjectId, phase_key: PhaseKey) -> Self {
        WorkflowPhaseInstance {
            project_id,
            phase_key,
            status: PhaseStatus::Pending,
            started_at: None,
            completed_at: None,
            completed_by: None,
            approved_by: None,
            approval_notes: None,
            entry_criteria_completed: false,
        }
    }

    /// Moves the instance to `in_progress`, stamping `started_at`.
    ///
    /// Idempotent for an already in-progress phase (the timestamp is
    /// refreshed). Callers must reject completed phases before calling.
    pub fn start(&mut self, now: DateTime<Utc>) {
        debug_assert!(!self.status.is_terminal());
        self.status = PhaseStatus::InProgress;
        self.started_at = Some(now);
    }

    /// Moves the instance to `completed`, stamping all approval fields.
    pub fn complete(&mut self, approver: &str, notes: Option<String>, now: DateTime<Utc>) {
        debug_assert_eq!(self.status, PhaseStatus::InProgress);
        self.status = PhaseStatus::Completed;
        self.completed_at = Some(now);
        self.completed_by = Some(approver.to_string());
        self.approved_by = Some(approver.to_string());
        self.approval_notes = notes;
        self.entry_criteria_completed = true;
    }
}

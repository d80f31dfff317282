//! Entry criteria: checklist conditions gating phase approval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CriterionId, PhaseKey, ProjectId};

/// A checklist condition scoped to `(project_id, phase_key)`.
///
/// Mandatory criteria block approval of the phase while incomplete.
/// Criteria are created when a phase starts (from the catalog template) or
/// manually, toggled by any authorized actor, and deleted explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryCriterion {
    pub id: CriterionId,
    pub project_id: ProjectId,
    pub phase_key: PhaseKey,

    pub title: String,
    pub description: Option<String>,

    /// Grouping label shown alongside the criterion (e.g. "content", "legal").
    pub area: String,

    pub is_mandatory: bool,
    pub is_completed: bool,

    /// Identity that completed the criterion. Cleared when un-completed.
    pub completed_by: Option<String>,

    /// Completion timestamp. Cleared when un-completed.
    pub completed_at: Option<DateTime<Utc>>,

    /// Optional link to supporting evidence.
    pub document_url: Option<String>,
}

impl EntryCriterion {
    pub fn new(
        id: CriterionId,
        project_id: ProjectId,
        phase_key: PhaseKey,
        title: impl Into<String>,
        area: impl Into<String>,
        is_mandatory: bool,
    ) -> Self {
        EntryCriterion {
            id,
            project_id,
            phase_key,
            title: title.into(),
            description: None,
            area: area.into(),
            is_mandatory,
            is_completed: false,
            completed_by: None,
            completed_at: None,
            document_url: None,
        }
    }

    /// Flips the completion flag.
    ///
    /// Completion stamps the actor and time; un-completion clears both.
    pub fn toggle(&mut self, actor: &str, now: DateTime<Utc>) {
        if self.is_completed {
            self.is_completed = false;
            self.completed_by = None;
            self.completed_at = None;
        } else {
            self.is_completed = true;
            self.completed_by = Some(actor.to_string());
            self.completed_at = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_criterion() -> EntryCriterion {
        EntryCriterion::new(
            CriterionId(1),
            ProjectId::new("p1"),
            PhaseKey::new("activation"),
            "Contract signed",
            "legal",
            true,
        )
    }

    #[test]
    fn toggle_completes_and_stamps() {
        let mut criterion = make_criterion();
        let now = Utc::now();

        criterion.toggle("pm@example.com", now);

        assert!(criterion.is_completed);
        assert_eq!(criterion.completed_by.as_deref(), Some("pm@example.com"));
        assert_eq!(criterion.completed_at, Some(now));
    }

    #[test]
    fn toggle_twice_clears_stamps() {
        let mut criterion = make_criterion();
        let now = Utc::now();

        criterion.toggle("pm@example.com", now);
        criterion.toggle("someone-else@example.com", now);

        assert!(!criterion.is_completed);
        assert!(criterion.completed_by.is_none());
        assert!(criterion.completed_at.is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let mut criterion = make_criterion();
        criterion.toggle("pm@example.com", Utc::now());

        let json = serde_json::to_string(&criterion).unwrap();
        let parsed: EntryCriterion = serde_json::from_str(&json).unwrap();
        assert_eq!(criterion, parsed);
    }
}

//! Per-phase checklist templates.
//!
//! When a phase is started and no criteria exist yet for it, the template
//! below seeds the initial checklist. Criteria created this way behave
//! exactly like manually created ones afterwards.

use crate::types::{CriterionId, EntryCriterion, PhaseKey, ProjectId};

/// A template entry instantiated into an [`EntryCriterion`] on phase start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriterionTemplate {
    pub title: &'static str,
    pub area: &'static str,
    pub is_mandatory: bool,
}

const ACTIVATION: &[CriterionTemplate] = &[
    CriterionTemplate {
        title: "Contract signed",
        area: "legal",
        is_mandatory: true,
    },
    CriterionTemplate {
        title: "Project team assigned",
        area: "staffing",
        is_mandatory: true,
    },
    CriterionTemplate {
        title: "Kickoff meeting held",
        area: "process",
        is_mandatory: false,
    },
];

const PLANNING: &[CriterionTemplate] = &[
    CriterionTemplate {
        title: "Scope document approved",
        area: "scope",
        is_mandatory: true,
    },
    CriterionTemplate {
        title: "Schedule baseline agreed",
        area: "schedule",
        is_mandatory: true,
    },
];

const DESIGN: &[CriterionTemplate] = &[
    CriterionTemplate {
        title: "Design sign-off received",
        area: "design",
        is_mandatory: true,
    },
    CriterionTemplate {
        title: "Asset inventory delivered",
        area: "content",
        is_mandatory: false,
    },
];

const DEVELOPMENT: &[CriterionTemplate] = &[
    CriterionTemplate {
        title: "All committed features implemented",
        area: "build",
        is_mandatory: true,
    },
    CriterionTemplate {
        title: "Code review completed",
        area: "build",
        is_mandatory: true,
    },
];

const CONTENT_UPLOAD: &[CriterionTemplate] = &[
    CriterionTemplate {
        title: "All pages populated",
        area: "content",
        is_mandatory: true,
    },
    CriterionTemplate {
        title: "Legal texts in place",
        area: "legal",
        is_mandatory: true,
    },
];

const QA_COMPLETE: &[CriterionTemplate] = &[
    CriterionTemplate {
        title: "Test plan executed",
        area: "qa",
        is_mandatory: true,
    },
    CriterionTemplate {
        title: "No open blocker defects",
        area: "qa",
        is_mandatory: true,
    },
    CriterionTemplate {
        title: "Accessibility check performed",
        area: "qa",
        is_mandatory: false,
    },
];

const LAUNCH: &[CriterionTemplate] = &[
    CriterionTemplate {
        title: "Go-live approval from stakeholders",
        area: "process",
        is_mandatory: true,
    },
    CriterionTemplate {
        title: "Rollback plan documented",
        area: "process",
        is_mandatory: true,
    },
];

/// Returns the checklist template for a phase, empty for phases without one.
pub fn template_for(phase_key: &PhaseKey) -> &'static [CriterionTemplate] {
    match phase_key.as_str() {
        "activation" => ACTIVATION,
        "planning" => PLANNING,
        "design" => DESIGN,
        "development" => DEVELOPMENT,
        "content_upload" => CONTENT_UPLOAD,
        "qa_complete" => QA_COMPLETE,
        "launch" => LAUNCH,
        _ => &[],
    }
}

/// Instantiates a template into criteria rows for one project and phase.
///
/// IDs are assigned by the caller (the store hands out fresh ones); this
/// function only shapes the rows.
pub fn instantiate(
    template: &[CriterionTemplate],
    project_id: &ProjectId,
    phase_key: &PhaseKey,
    mut next_id: impl FnMut() -> CriterionId,
) -> Vec<EntryCriterion> {
    template
        .iter()
        .map(|t| {
            EntryCriterion::new(
                next_id(),
                project_id.clone(),
                phase_key.clone(),
                t.title,
                t.area,
                t.is_mandatory,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PhaseRegistry;

    #[test]
    fn every_gated_phase_has_a_mandatory_template_entry() {
        let registry = PhaseRegistry::new();
        for def in registry.iter().filter(|d| d.has_entry_criteria) {
            let template = template_for(&PhaseKey::new(def.key));
            assert!(
                template.iter().any(|t| t.is_mandatory),
                "phase {} has entry criteria but no mandatory template entry",
                def.key
            );
        }
    }

    #[test]
    fn ungated_phase_has_empty_template() {
        assert!(template_for(&PhaseKey::new("live")).is_empty());
        assert!(template_for(&PhaseKey::new("nonsense")).is_empty());
    }

    #[test]
    fn instantiate_assigns_sequential_ids() {
        let mut counter = 0u64;
        let rows = instantiate(
            template_for(&PhaseKey::new("planning")),
            &ProjectId::new("p1"),
            &PhaseKey::new("planning"),
            || {
                counter += 1;
                CriterionId(counter)
            },
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, CriterionId(1));
        assert_eq!(rows[1].id, CriterionId(2));
        assert!(rows.iter().all(|c| !c.is_completed));
    }
}

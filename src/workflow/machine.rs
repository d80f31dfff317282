//! The phase state machine.
//!
//! A stateless decision core in the style of the pure state modules: all
//! project state is passed in as a snapshot, and outcomes describe what to
//! persist. No I/O happens here.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::criteria::{self, CriterionTemplate, GateStatus};
use crate::registry::{PhaseRegistry, UnknownPhase};
use crate::types::{Actor, EntryCriterion, PhaseKey, PhaseStatus, ProjectId, Role, WorkflowPhaseInstance};

/// Errors from workflow transitions.
///
/// Everything here is request-scoped; the structured fields carry enough
/// detail for a precise caller-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    UnknownPhase(#[from] UnknownPhase),

    /// A lower-ordinal phase has not been completed yet. Names the first
    /// unmet predecessor in catalog order.
    #[error("preceding phase {phase} is not completed")]
    PrecedingPhaseIncomplete { phase: PhaseKey },

    /// The phase was already approved; transitions never regress.
    #[error("phase {phase} is already completed")]
    PhaseAlreadyCompleted { phase: PhaseKey },

    /// Approval requested for a phase that was never started.
    #[error("phase {phase} has not been started")]
    PhaseNotStarted { phase: PhaseKey },

    /// The actor's role is not in the phase's approver set.
    #[error("role {role} is not authorized to approve {phase}")]
    Unauthorized { role: Role, phase: PhaseKey },

    /// Mandatory entry criteria are still open.
    #[error("entry criteria incomplete: {completed} of {mandatory} mandatory done")]
    EntryCriteriaIncomplete { completed: usize, mandatory: usize },
}

/// Result of a successful `start_phase` decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOutcome {
    /// The instance to persist (created or re-stamped).
    pub instance: WorkflowPhaseInstance,

    /// The advanced `current_phase` pointer for the project.
    pub current_phase: PhaseKey,

    /// Template entries to instantiate into criteria rows, empty when the
    /// phase already has criteria or defines none.
    pub seed_template: &'static [CriterionTemplate],
}

/// Result of a successful `approve_phase` decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveOutcome {
    /// The completed instance to persist.
    pub instance: WorkflowPhaseInstance,

    /// The advanced `current_phase` pointer for the project.
    pub current_phase: PhaseKey,

    /// Gate status observed at approval time (snapshot for the record).
    pub gate: GateStatus,
}

/// Stateless phase state machine over the static catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseStateMachine {
    registry: PhaseRegistry,
}

impl PhaseStateMachine {
    pub fn new(registry: PhaseRegistry) -> Self {
        PhaseStateMachine { registry }
    }

    pub fn registry(&self) -> &PhaseRegistry {
        &self.registry
    }

    /// Derives the project's `current_phase` pointer from the completed set:
    /// the lowest-ordinal phase that is not completed, or the final phase
    /// once everything is done.
    pub fn derive_current_phase(
        &self,
        instances: &HashMap<PhaseKey, WorkflowPhaseInstance>,
    ) -> PhaseKey {
        for def in self.registry.iter() {
            let key = PhaseKey::new(def.key);
            let completed = instances
                .get(&key)
                .map(|i| i.status == PhaseStatus::Completed)
                .unwrap_or(false);
            if !completed {
                return key;
            }
        }
        // Entire catalog completed: the pointer rests on the last phase.
        PhaseKey::new(
            self.registry
                .iter()
                .last()
                .map(|def| def.key)
                .unwrap_or_default(),
        )
    }

    /// Decides a `start_phase` request.
    ///
    /// Preconditions: every lower-ordinal phase is completed. Starting an
    /// in-progress phase is a re-affirmation (the `started_at` stamp is
    /// refreshed); starting a completed phase is rejected.
    ///
    /// `has_existing_criteria` tells the machine whether criteria rows
    /// already exist for this phase, so the template is only seeded once.
    pub fn start_phase(
        &self,
        project_id: &ProjectId,
        phase_key: &PhaseKey,
        instances: &HashMap<PhaseKey, WorkflowPhaseInstance>,
        has_existing_criteria: bool,
        now: DateTime<Utc>,
    ) -> Result<StartOutcome, WorkflowError> {
        let ordinal = self.registry.ordinal(phase_key)?;

        // Total-order gating: the first unmet predecessor is reported.
        for def in self.registry.iter().take(ordinal) {
            let key = PhaseKey::new(def.key);
            let completed = instances
                .get(&key)
                .map(|i| i.status == PhaseStatus::Completed)
                .unwrap_or(false);
            if !completed {
                return Err(WorkflowError::PrecedingPhaseIncomplete { phase: key });
            }
        }

        let mut instance = match instances.get(phase_key) {
            Some(existing) if existing.status == PhaseStatus::Completed => {
                return Err(WorkflowError::PhaseAlreadyCompleted {
                    phase: phase_key.clone(),
                });
            }
            Some(existing) => existing.clone(),
            None => WorkflowPhaseInstance::new(project_id.clone(), phase_key.clone()),
        };
        instance.start(now);

        let seed_template = if self.registry.requires_entry_criteria(phase_key)?
            && !has_existing_criteria
        {
            criteria::template_for(phase_key)
        } else {
            &[]
        };

        Ok(StartOutcome {
            instance,
            current_phase: phase_key.clone(),
            seed_template,
        })
    }

    /// Decides an `approve_phase` request.
    ///
    /// Preconditions, checked in order: the instance is in progress, the
    /// actor's role is in the approver set, and (for gated phases) every
    /// mandatory entry criterion is completed.
    pub fn approve_phase(
        &self,
        phase_key: &PhaseKey,
        instance: Option<&WorkflowPhaseInstance>,
        phase_criteria: &[EntryCriterion],
        actor: &Actor,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ApproveOutcome, WorkflowError> {
        let approver = self.registry.approver(phase_key)?;

        let instance = match instance {
            Some(i) if i.status == PhaseStatus::InProgress => i,
            Some(i) if i.status == PhaseStatus::Completed => {
                return Err(WorkflowError::PhaseAlreadyCompleted {
                    phase: phase_key.clone(),
                });
            }
            _ => {
                return Err(WorkflowError::PhaseNotStarted {
                    phase: phase_key.clone(),
                });
            }
        };

        if !approver.authorize(actor.role) {
            return Err(WorkflowError::Unauthorized {
                role: actor.role,
                phase: phase_key.clone(),
            });
        }

        let gate = criteria::evaluate(phase_criteria);
        if self.registry.requires_entry_criteria(phase_key)? && !gate.satisfied {
            return Err(WorkflowError::EntryCriteriaIncomplete {
                completed: gate.completed,
                mandatory: gate.mandatory,
            });
        }

        let mut completed = instance.clone();
        completed.complete(&actor.id, notes, now);

        // The pointer advances to the next catalog phase, or rests on the
        // final phase once the workflow is fully approved.
        let current_phase = self
            .registry
            .next_phase(phase_key)?
            .unwrap_or_else(|| phase_key.clone());

        Ok(ApproveOutcome {
            instance: completed,
            current_phase,
            gate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CriterionId;

    fn machine() -> PhaseStateMachine {
        PhaseStateMachine::new(PhaseRegistry::new())
    }

    fn key(s: &str) -> PhaseKey {
        PhaseKey::new(s)
    }

    fn project() -> ProjectId {
        ProjectId::new("p1")
    }

    /// Instances for every catalog phase strictly before `until`, all completed.
    fn completed_through(until: &str) -> HashMap<PhaseKey, WorkflowPhaseInstance> {
        let m = machine();
        let stop = m.registry().ordinal(&key(until)).unwrap();
        let now = Utc::now();

        m.registry()
            .iter()
            .take(stop)
            .map(|def| {
                let mut instance = WorkflowPhaseInstance::new(project(), key(def.key));
                instance.start(now);
                instance.complete("pm@example.com", None, now);
                (key(def.key), instance)
            })
            .collect()
    }

    fn mandatory_criteria(phase: &str, total: usize, completed: usize) -> Vec<EntryCriterion> {
        (0..total)
            .map(|i| {
                let mut c = EntryCriterion::new(
                    CriterionId(i as u64),
                    project(),
                    key(phase),
                    format!("c{}", i),
                    "general",
                    true,
                );
                if i < completed {
                    c.toggle("actor@example.com", Utc::now());
                }
                c
            })
            .collect()
    }

    mod start_phase {
        use super::*;

        #[test]
        fn first_phase_starts_on_empty_project() {
            let outcome = machine()
                .start_phase(&project(), &key("activation"), &HashMap::new(), false, Utc::now())
                .unwrap();

            assert_eq!(outcome.instance.status, PhaseStatus::InProgress);
            assert_eq!(outcome.current_phase, key("activation"));
            assert!(!outcome.seed_template.is_empty());
        }

        #[test]
        fn fails_when_a_predecessor_is_incomplete() {
            // development is in progress, qa is further down the catalog
            let mut instances = completed_through("development");
            let mut dev = WorkflowPhaseInstance::new(project(), key("development"));
            dev.start(Utc::now());
            instances.insert(key("development"), dev);

            let err = machine()
                .start_phase(&project(), &key("qa_complete"), &instances, false, Utc::now())
                .unwrap_err();

            assert_eq!(
                err,
                WorkflowError::PrecedingPhaseIncomplete {
                    phase: key("development")
                }
            );
        }

        #[test]
        fn names_the_first_unmet_predecessor() {
            // Nothing completed at all: activation is the first gap.
            let err = machine()
                .start_phase(&project(), &key("launch"), &HashMap::new(), false, Utc::now())
                .unwrap_err();

            assert_eq!(
                err,
                WorkflowError::PrecedingPhaseIncomplete {
                    phase: key("activation")
                }
            );
        }

        #[test]
        fn restart_of_in_progress_phase_restamps() {
            let m = machine();
            let first = m
                .start_phase(&project(), &key("activation"), &HashMap::new(), false, Utc::now())
                .unwrap();

            let mut instances = HashMap::new();
            instances.insert(key("activation"), first.instance);

            let later = Utc::now();
            let second = m
                .start_phase(&project(), &key("activation"), &instances, true, later)
                .unwrap();

            assert_eq!(second.instance.status, PhaseStatus::InProgress);
            assert_eq!(second.instance.started_at, Some(later));
            // Criteria already exist, so nothing is re-seeded.
            assert!(second.seed_template.is_empty());
        }

        #[test]
        fn starting_a_completed_phase_is_rejected() {
            let instances = completed_through("planning");

            let err = machine()
                .start_phase(&project(), &key("activation"), &instances, true, Utc::now())
                .unwrap_err();

            assert_eq!(
                err,
                WorkflowError::PhaseAlreadyCompleted {
                    phase: key("activation")
                }
            );
        }

        #[test]
        fn ungated_phase_seeds_no_template() {
            let instances = completed_through("live");

            let outcome = machine()
                .start_phase(&project(), &key("live"), &instances, false, Utc::now())
                .unwrap();

            assert!(outcome.seed_template.is_empty());
        }

        #[test]
        fn unknown_phase_is_rejected() {
            let err = machine()
                .start_phase(&project(), &key("warranty"), &HashMap::new(), false, Utc::now())
                .unwrap_err();

            assert!(matches!(err, WorkflowError::UnknownPhase(_)));
        }
    }

    mod approve_phase {
        use super::*;

        fn in_progress(phase: &str) -> WorkflowPhaseInstance {
            let mut instance = WorkflowPhaseInstance::new(project(), key(phase));
            instance.start(Utc::now());
            instance
        }

        fn actor(role: Role) -> Actor {
            Actor::new("actor@example.com", role)
        }

        #[test]
        fn approval_succeeds_with_satisfied_gate_and_authorized_role() {
            let instance = in_progress("planning");
            let criteria = mandatory_criteria("planning", 2, 2);

            let outcome = machine()
                .approve_phase(
                    &key("planning"),
                    Some(&instance),
                    &criteria,
                    &actor(Role::ProductOwner),
                    Some("approved".to_string()),
                    Utc::now(),
                )
                .unwrap();

            assert_eq!(outcome.instance.status, PhaseStatus::Completed);
            assert_eq!(outcome.current_phase, key("design"));
            assert!(outcome.instance.entry_criteria_completed);
        }

        #[test]
        fn incomplete_mandatory_criteria_block_approval() {
            let instance = in_progress("activation");
            let criteria = mandatory_criteria("activation", 5, 3);

            let err = machine()
                .approve_phase(
                    &key("activation"),
                    Some(&instance),
                    &criteria,
                    &actor(Role::ProjectManager),
                    None,
                    Utc::now(),
                )
                .unwrap_err();

            assert_eq!(
                err,
                WorkflowError::EntryCriteriaIncomplete {
                    completed: 3,
                    mandatory: 5
                }
            );
        }

        #[test]
        fn zero_mandatory_criteria_never_block() {
            let instance = in_progress("planning");

            let outcome = machine()
                .approve_phase(
                    &key("planning"),
                    Some(&instance),
                    &[],
                    &actor(Role::ProductOwner),
                    None,
                    Utc::now(),
                )
                .unwrap();

            assert_eq!(outcome.gate.mandatory, 0);
            assert!(outcome.gate.satisfied);
        }

        #[test]
        fn wrong_role_is_unauthorized() {
            let instance = in_progress("planning");

            let err = machine()
                .approve_phase(
                    &key("planning"),
                    Some(&instance),
                    &[],
                    &actor(Role::Qa),
                    None,
                    Utc::now(),
                )
                .unwrap_err();

            assert_eq!(
                err,
                WorkflowError::Unauthorized {
                    role: Role::Qa,
                    phase: key("planning")
                }
            );
        }

        #[test]
        fn either_approver_works_for_development() {
            for role in [Role::Developer, Role::ProjectManager] {
                let instance = in_progress("development");
                let outcome = machine()
                    .approve_phase(
                        &key("development"),
                        Some(&instance),
                        &[],
                        &actor(role),
                        None,
                        Utc::now(),
                    )
                    .unwrap();
                assert_eq!(outcome.instance.status, PhaseStatus::Completed);
            }
        }

        #[test]
        fn unstarted_phase_cannot_be_approved() {
            let err = machine()
                .approve_phase(
                    &key("planning"),
                    None,
                    &[],
                    &actor(Role::ProductOwner),
                    None,
                    Utc::now(),
                )
                .unwrap_err();

            assert_eq!(
                err,
                WorkflowError::PhaseNotStarted {
                    phase: key("planning")
                }
            );
        }

        #[test]
        fn completed_phase_cannot_be_approved_again() {
            let mut instance = in_progress("planning");
            instance.complete("po@example.com", None, Utc::now());

            let err = machine()
                .approve_phase(
                    &key("planning"),
                    Some(&instance),
                    &[],
                    &actor(Role::ProductOwner),
                    None,
                    Utc::now(),
                )
                .unwrap_err();

            assert_eq!(
                err,
                WorkflowError::PhaseAlreadyCompleted {
                    phase: key("planning")
                }
            );
        }

        #[test]
        fn approving_the_final_phase_keeps_the_pointer_there() {
            let instance = in_progress("live");

            let outcome = machine()
                .approve_phase(
                    &key("live"),
                    Some(&instance),
                    &[],
                    &actor(Role::ProjectManager),
                    None,
                    Utc::now(),
                )
                .unwrap();

            assert_eq!(outcome.current_phase, key("live"));
        }
    }

    mod derive_current_phase {
        use super::*;

        #[test]
        fn empty_project_points_at_first_phase() {
            assert_eq!(
                machine().derive_current_phase(&HashMap::new()),
                key("activation")
            );
        }

        #[test]
        fn points_at_first_non_completed_phase() {
            let instances = completed_through("design");
            assert_eq!(machine().derive_current_phase(&instances), key("design"));
        }

        #[test]
        fn fully_completed_project_points_at_last_phase() {
            let m = machine();
            let now = Utc::now();
            let instances: HashMap<_, _> = m
                .registry()
                .iter()
                .map(|def| {
                    let mut instance = WorkflowPhaseInstance::new(project(), key(def.key));
                    instance.start(now);
                    instance.complete("pm@example.com", None, now);
                    (key(def.key), instance)
                })
                .collect();

            assert_eq!(m.derive_current_phase(&instances), key("live"));
        }
    }
}

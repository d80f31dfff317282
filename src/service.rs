//! Project service: orchestration between the decision cores and the store.
//!
//! The decision logic (state machine, gate evaluation, recalculation) is
//! pure; this layer loads snapshots, invokes a decision, and persists the
//! outcome. Writes for a given project are serialised through a per-project
//! lock so two concurrent requests cannot interleave their read-decide-write
//! cycles.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::criteria::{self, GateStatus};
use crate::schedule::{RecalcEngine, RecalcError};
use crate::store::{EntityStore, StoreError};
use crate::types::{
    Actor, CriterionId, EntryCriterion, PhaseKey, Project, ProjectId, SchedulePhase,
    WorkflowPhaseInstance,
};
use crate::workflow::{PhaseStateMachine, WorkflowError};

/// Errors surfaced by service operations. Each variant maps to a stable
/// machine-readable code via [`ServiceError::code`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Recalc(#[from] RecalcError),

    #[error("criterion {0} not found")]
    CriterionNotFound(CriterionId),

    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A recalculation batch failed after some phases were already written.
    /// Single-row writes are all the store guarantees, so the rows named in
    /// `written` are durable; the caller must retry from fresh state.
    #[error("schedule write failed after {} phases were written: {source}", written.len())]
    PartialRecalc {
        written: Vec<PhaseKey>,
        source: StoreError,
    },
}

impl ServiceError {
    /// Stable error code used in API responses and logs.
    pub fn code(&self) -> &'static str {
        use crate::schedule::GraphError;
        match self {
            ServiceError::Workflow(WorkflowError::UnknownPhase(_)) => "unknown_phase",
            ServiceError::Workflow(WorkflowError::PrecedingPhaseIncomplete { .. }) => {
                "preceding_phase_incomplete"
            }
            ServiceError::Workflow(WorkflowError::PhaseAlreadyCompleted { .. }) => {
                "phase_already_completed"
            }
            ServiceError::Workflow(WorkflowError::PhaseNotStarted { .. }) => "phase_not_started",
            ServiceError::Workflow(WorkflowError::Unauthorized { .. }) => "unauthorized",
            ServiceError::Workflow(WorkflowError::EntryCriteriaIncomplete { .. }) => {
                "entry_criteria_incomplete"
            }
            ServiceError::Recalc(RecalcError::Graph(GraphError::CyclicDependency(_))) => {
                "cyclic_dependency"
            }
            ServiceError::Recalc(RecalcError::Graph(_)) => "unknown_phase",
            ServiceError::Recalc(RecalcError::InvalidEndDate { .. }) => "invalid_date",
            ServiceError::CriterionNotFound(_) | ServiceError::ProjectNotFound(_) => "not_found",
            ServiceError::Store(StoreError::StaleWrite { .. })
            | ServiceError::PartialRecalc {
                source: StoreError::StaleWrite { .. },
                ..
            } => "stale_write",
            ServiceError::Store(StoreError::Unavailable(_))
            | ServiceError::PartialRecalc { .. } => "store_unavailable",
        }
    }

    /// Phases durably written before the operation failed. Empty for
    /// anything but a partial recalculation.
    pub fn written(&self) -> &[PhaseKey] {
        match self {
            ServiceError::PartialRecalc { written, .. } => written,
            _ => &[],
        }
    }
}

/// Result of starting a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartPhaseResult {
    pub instance: WorkflowPhaseInstance,
    pub current_phase: PhaseKey,
    /// Criteria created from the phase template on first start.
    pub seeded_criteria: Vec<EntryCriterion>,
}

/// Result of approving a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovePhaseResult {
    pub instance: WorkflowPhaseInstance,
    pub current_phase: PhaseKey,
    pub gate: GateStatus,
}

/// Fields of a manually added criterion.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCriterion {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub area: String,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default)]
    pub document_url: Option<String>,
}

/// Result of toggling an entry criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleCriterionResult {
    pub criterion: EntryCriterion,
    /// Gate status of the criterion's phase after the toggle.
    pub gate: GateStatus,
}

/// Result of a schedule recalculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecalculateResult {
    /// The edited phase as persisted (version bumped when it changed).
    pub modified: SchedulePhase,
    /// Dependents that changed, as persisted, in write order.
    pub cascade: Vec<SchedulePhase>,
}

impl RecalculateResult {
    pub fn cascade_count(&self) -> usize {
        self.cascade.len()
    }
}

pub struct ProjectService<S> {
    store: S,
    machine: PhaseStateMachine,
    recalc: RecalcEngine,
    locks: std::sync::Mutex<HashMap<ProjectId, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: EntityStore> ProjectService<S> {
    pub fn new(store: S) -> Self {
        ProjectService {
            store,
            machine: PhaseStateMachine::default(),
            recalc: RecalcEngine::new(),
            locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn project_lock(&self, project: &ProjectId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        locks.entry(project.clone()).or_default().clone()
    }

    async fn instances_by_phase(
        &self,
        project: &ProjectId,
    ) -> Result<HashMap<PhaseKey, WorkflowPhaseInstance>, ServiceError> {
        Ok(self
            .store
            .list_instances(project)
            .await?
            .into_iter()
            .map(|i| (i.phase_key.clone(), i))
            .collect())
    }

    /// Starts a phase. Creates the project record on the very first start,
    /// seeds the phase's criteria template if none exist yet, and advances
    /// the project's phase pointer.
    pub async fn start_phase(
        &self,
        project_id: &ProjectId,
        phase_key: &PhaseKey,
    ) -> Result<StartPhaseResult, ServiceError> {
        let lock = self.project_lock(project_id);
        let _guard = lock.lock().await;

        let mut instances = self.instances_by_phase(project_id).await?;
        let existing = self.store.list_criteria(project_id, phase_key).await?;

        let outcome = self.machine.start_phase(
            project_id,
            phase_key,
            &instances,
            !existing.is_empty(),
            Utc::now(),
        )?;

        self.store.upsert_instance(&outcome.instance).await?;

        // The pointer is derived state: recompute it from the completed set
        // rather than trusting any stored value.
        instances.insert(phase_key.clone(), outcome.instance.clone());
        let current_phase = self.machine.derive_current_phase(&instances);

        let seeded_criteria = if outcome.seed_template.is_empty() {
            Vec::new()
        } else {
            // The store assigns ids, so the placeholder here never persists.
            let rows = criteria::instantiate(outcome.seed_template, project_id, phase_key, || {
                CriterionId::new(0)
            });
            self.store.create_criteria(rows).await?
        };

        self.store
            .save_project(&Project::new(project_id.clone(), current_phase.clone()))
            .await?;

        info!(
            project = %project_id,
            phase = %phase_key,
            seeded = seeded_criteria.len(),
            "phase started"
        );

        Ok(StartPhaseResult {
            instance: outcome.instance,
            current_phase,
            seeded_criteria,
        })
    }

    /// Approves (completes) a phase on behalf of `actor` and advances the
    /// project's phase pointer.
    pub async fn approve_phase(
        &self,
        project_id: &ProjectId,
        phase_key: &PhaseKey,
        actor: &Actor,
        notes: Option<String>,
    ) -> Result<ApprovePhaseResult, ServiceError> {
        let lock = self.project_lock(project_id);
        let _guard = lock.lock().await;

        let mut instances = self.instances_by_phase(project_id).await?;
        let phase_criteria = self.store.list_criteria(project_id, phase_key).await?;

        let outcome = self.machine.approve_phase(
            phase_key,
            instances.get(phase_key),
            &phase_criteria,
            actor,
            notes,
            Utc::now(),
        )?;

        self.store.upsert_instance(&outcome.instance).await?;

        // The pointer is derived state: recompute it from the completed set
        // rather than trusting any stored value.
        instances.insert(phase_key.clone(), outcome.instance.clone());
        let current_phase = self.machine.derive_current_phase(&instances);

        self.store
            .save_project(&Project::new(project_id.clone(), current_phase.clone()))
            .await?;

        info!(
            project = %project_id,
            phase = %phase_key,
            approver = %actor.id,
            role = %actor.role,
            next = %current_phase,
            "phase approved"
        );

        Ok(ApprovePhaseResult {
            instance: outcome.instance,
            current_phase,
            gate: outcome.gate,
        })
    }

    /// Adds a manual entry criterion to a phase, alongside whatever the
    /// template seeded.
    pub async fn add_criterion(
        &self,
        project_id: &ProjectId,
        phase_key: &PhaseKey,
        new: NewCriterion,
    ) -> Result<EntryCriterion, ServiceError> {
        self.machine
            .registry()
            .definition(phase_key)
            .map_err(WorkflowError::from)?;

        let lock = self.project_lock(project_id);
        let _guard = lock.lock().await;

        let mut row = EntryCriterion::new(
            CriterionId::new(0),
            project_id.clone(),
            phase_key.clone(),
            new.title,
            new.area,
            new.is_mandatory,
        );
        row.description = new.description;
        row.document_url = new.document_url;

        let mut stored = self.store.create_criteria(vec![row]).await?;
        let criterion = stored.remove(0);

        info!(
            project = %project_id,
            phase = %phase_key,
            criterion = %criterion.id,
            mandatory = criterion.is_mandatory,
            "criterion added"
        );

        Ok(criterion)
    }

    /// Removes one entry criterion.
    pub async fn delete_criterion(
        &self,
        criterion_id: CriterionId,
    ) -> Result<(), ServiceError> {
        let found = self
            .store
            .get_criterion(criterion_id)
            .await?
            .ok_or(ServiceError::CriterionNotFound(criterion_id))?;

        let lock = self.project_lock(&found.project_id);
        let _guard = lock.lock().await;

        if !self.store.delete_criterion(criterion_id).await? {
            return Err(ServiceError::CriterionNotFound(criterion_id));
        }

        info!(
            project = %found.project_id,
            phase = %found.phase_key,
            criterion = %criterion_id,
            "criterion deleted"
        );

        Ok(())
    }

    /// Flips one entry criterion's completion state and reports the gate
    /// status of its phase afterwards.
    pub async fn toggle_criterion(
        &self,
        criterion_id: CriterionId,
        actor: &Actor,
    ) -> Result<ToggleCriterionResult, ServiceError> {
        let found = self
            .store
            .get_criterion(criterion_id)
            .await?
            .ok_or(ServiceError::CriterionNotFound(criterion_id))?;

        let lock = self.project_lock(&found.project_id);
        let _guard = lock.lock().await;

        // Re-read under the lock; another request may have toggled it.
        let mut criterion = self
            .store
            .get_criterion(criterion_id)
            .await?
            .ok_or(ServiceError::CriterionNotFound(criterion_id))?;

        criterion.toggle(&actor.id, Utc::now());
        self.store.update_criterion(&criterion).await?;

        let phase_criteria = self
            .store
            .list_criteria(&criterion.project_id, &criterion.phase_key)
            .await?;
        let gate = criteria::evaluate(&phase_criteria);

        info!(
            project = %criterion.project_id,
            phase = %criterion.phase_key,
            criterion = %criterion_id,
            completed = criterion.is_completed,
            gate_satisfied = gate.satisfied,
            "criterion toggled"
        );

        Ok(ToggleCriterionResult { criterion, gate })
    }

    /// Moves one schedule phase's end date and cascades the change through
    /// its transitive dependents.
    ///
    /// Writes are guarded by the versions read in the snapshot; a concurrent
    /// edit fails the batch with a stale-write error. Rows written before
    /// the failure stay written, and the successful writes up to that point
    /// are reported in spans via the log.
    pub async fn recalculate(
        &self,
        project_id: &ProjectId,
        phase_key: &PhaseKey,
        new_end: NaiveDate,
    ) -> Result<RecalculateResult, ServiceError> {
        let lock = self.project_lock(project_id);
        let _guard = lock.lock().await;

        let snapshot = self.store.list_schedule(project_id).await?;
        if snapshot.is_empty() {
            return Err(ServiceError::ProjectNotFound(project_id.clone()));
        }

        let outcome = self.recalc.recalculate(&snapshot, phase_key, new_end)?;

        let versions: HashMap<&PhaseKey, u64> = snapshot
            .iter()
            .map(|p| (&p.phase_key, p.version))
            .collect();

        let mut modified = outcome.modified.clone();
        let mut cascade = Vec::with_capacity(outcome.cascade.len());
        let mut written: Vec<PhaseKey> = Vec::new();
        for row in outcome.updated() {
            let expected = versions.get(&row.phase_key).copied().unwrap_or(0);
            match self.store.update_schedule_phase(row, expected).await {
                Ok(stored) => {
                    written.push(stored.phase_key.clone());
                    if stored.phase_key == *phase_key {
                        modified = stored;
                    } else {
                        cascade.push(stored);
                    }
                }
                Err(err) => {
                    warn!(
                        project = %project_id,
                        phase = %row.phase_key,
                        written = written.len(),
                        error = %err,
                        "recalculation persist failed mid-batch"
                    );
                    // Rows already written stay written; report them so the
                    // caller knows what is durable before retrying.
                    if written.is_empty() {
                        return Err(err.into());
                    }
                    return Err(ServiceError::PartialRecalc {
                        written,
                        source: err,
                    });
                }
            }
        }

        info!(
            project = %project_id,
            phase = %phase_key,
            new_end = %new_end,
            cascade = cascade.len(),
            "schedule recalculated"
        );

        Ok(RecalculateResult { modified, cascade })
    }
}

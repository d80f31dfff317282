//! In-memory [`EntityStore`] implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::store::{EntityStore, StoreError};
use crate::types::{
    CriterionId, EntryCriterion, PhaseKey, Project, ProjectId, SchedulePhase,
    WorkflowPhaseInstance,
};

#[derive(Debug, Default)]
struct Inner {
    projects: HashMap<ProjectId, Project>,
    instances: HashMap<(ProjectId, PhaseKey), WorkflowPhaseInstance>,
    criteria: HashMap<CriterionId, EntryCriterion>,
    schedule: HashMap<(ProjectId, PhaseKey), SchedulePhase>,
    next_criterion_id: u64,
}

/// Hash-map backed store. All state lives behind one mutex; operations are
/// short and never await while holding it.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test and demo seeding; inserts a schedule row at version 0 without
    /// any stale-write check.
    pub fn insert_schedule_phase(&self, phase: SchedulePhase) {
        let mut inner = self.lock();
        inner
            .schedule
            .insert((phase.project_id.clone(), phase.phase_key.clone()), phase);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned mutex means a panic mid-write; state is unrecoverable
        // either way, so propagate the panic.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EntityStore for InMemoryStore {
    async fn load_project(&self, id: &ProjectId) -> Result<Option<Project>, StoreError> {
        Ok(self.lock().projects.get(id).cloned())
    }

    async fn save_project(&self, project: &Project) -> Result<(), StoreError> {
        self.lock()
            .projects
            .insert(project.id.clone(), project.clone());
        Ok(())
    }

    async fn list_instances(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<WorkflowPhaseInstance>, StoreError> {
        Ok(self
            .lock()
            .instances
            .values()
            .filter(|i| i.project_id == *project)
            .cloned()
            .collect())
    }

    async fn upsert_instance(&self, instance: &WorkflowPhaseInstance) -> Result<(), StoreError> {
        self.lock().instances.insert(
            (instance.project_id.clone(), instance.phase_key.clone()),
            instance.clone(),
        );
        Ok(())
    }

    async fn list_criteria(
        &self,
        project: &ProjectId,
        phase: &PhaseKey,
    ) -> Result<Vec<EntryCriterion>, StoreError> {
        let mut rows: Vec<EntryCriterion> = self
            .lock()
            .criteria
            .values()
            .filter(|c| c.project_id == *project && c.phase_key == *phase)
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.id);
        Ok(rows)
    }

    async fn create_criteria(
        &self,
        criteria: Vec<EntryCriterion>,
    ) -> Result<Vec<EntryCriterion>, StoreError> {
        let mut inner = self.lock();
        let mut stored = Vec::with_capacity(criteria.len());
        for mut row in criteria {
            inner.next_criterion_id += 1;
            row.id = CriterionId::new(inner.next_criterion_id);
            inner.criteria.insert(row.id, row.clone());
            stored.push(row);
        }
        Ok(stored)
    }

    async fn get_criterion(&self, id: CriterionId) -> Result<Option<EntryCriterion>, StoreError> {
        Ok(self.lock().criteria.get(&id).cloned())
    }

    async fn update_criterion(&self, criterion: &EntryCriterion) -> Result<(), StoreError> {
        self.lock().criteria.insert(criterion.id, criterion.clone());
        Ok(())
    }

    async fn delete_criterion(&self, id: CriterionId) -> Result<bool, StoreError> {
        Ok(self.lock().criteria.remove(&id).is_some())
    }

    async fn list_schedule(&self, project: &ProjectId) -> Result<Vec<SchedulePhase>, StoreError> {
        let mut rows: Vec<SchedulePhase> = self
            .lock()
            .schedule
            .values()
            .filter(|p| p.project_id == *project)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.phase_key.cmp(&b.phase_key));
        Ok(rows)
    }

    async fn update_schedule_phase(
        &self,
        phase: &SchedulePhase,
        expected_version: u64,
    ) -> Result<SchedulePhase, StoreError> {
        let mut inner = self.lock();
        let key = (phase.project_id.clone(), phase.phase_key.clone());
        let current = inner
            .schedule
            .get(&key)
            .map(|p| p.version)
            .unwrap_or(expected_version);
        if current != expected_version {
            return Err(StoreError::StaleWrite {
                phase: phase.phase_key.clone(),
                expected: expected_version,
                actual: current,
            });
        }
        let mut row = phase.clone();
        row.version = expected_version + 1;
        inner.schedule.insert(key, row.clone());
        Ok(row)
    }
}

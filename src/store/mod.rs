//! Persistence trait for workflow and schedule state.
//!
//! The service layer only sees [`EntityStore`]; everything it needs is
//! expressed as async methods so a database-backed implementation can slot
//! in without touching the decision logic. [`memory::InMemoryStore`] is the
//! in-process implementation used by the server and the tests.

use std::future::Future;

use thiserror::Error;

use crate::types::{
    CriterionId, EntryCriterion, PhaseKey, Project, ProjectId, SchedulePhase,
    WorkflowPhaseInstance,
};

pub mod memory;

pub use memory::InMemoryStore;

/// Errors surfaced by a store backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A schedule write carried a version that no longer matches the stored
    /// row. The caller saw stale state and must re-read before retrying.
    #[error("stale write on phase {phase}: expected version {expected}, found {actual}")]
    StaleWrite {
        phase: PhaseKey,
        expected: u64,
        actual: u64,
    },

    /// The backend could not be reached or failed mid-operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Storage operations needed by the workflow and schedule services.
///
/// Implementations must make each individual method atomic; cross-method
/// transactionality is the service layer's problem (it serialises writes per
/// project).
pub trait EntityStore: Send + Sync {
    /// Loads a project record, if one exists.
    fn load_project(
        &self,
        id: &ProjectId,
    ) -> impl Future<Output = Result<Option<Project>, StoreError>> + Send;

    /// Creates or replaces a project record.
    fn save_project(
        &self,
        project: &Project,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// All workflow phase instances recorded for a project.
    fn list_instances(
        &self,
        project: &ProjectId,
    ) -> impl Future<Output = Result<Vec<WorkflowPhaseInstance>, StoreError>> + Send;

    /// Creates or replaces one phase instance, keyed by (project, phase).
    fn upsert_instance(
        &self,
        instance: &WorkflowPhaseInstance,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Entry criteria recorded for one phase of a project.
    fn list_criteria(
        &self,
        project: &ProjectId,
        phase: &PhaseKey,
    ) -> impl Future<Output = Result<Vec<EntryCriterion>, StoreError>> + Send;

    /// Inserts new criteria rows. Identifiers on the incoming rows are
    /// ignored; the store assigns them and returns the stored rows.
    fn create_criteria(
        &self,
        criteria: Vec<EntryCriterion>,
    ) -> impl Future<Output = Result<Vec<EntryCriterion>, StoreError>> + Send;

    /// Looks up a single criterion by id.
    fn get_criterion(
        &self,
        id: CriterionId,
    ) -> impl Future<Output = Result<Option<EntryCriterion>, StoreError>> + Send;

    /// Replaces an existing criterion row.
    fn update_criterion(
        &self,
        criterion: &EntryCriterion,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes a criterion row. Returns false if no row had that id.
    fn delete_criterion(
        &self,
        id: CriterionId,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// All schedule rows for a project.
    fn list_schedule(
        &self,
        project: &ProjectId,
    ) -> impl Future<Output = Result<Vec<SchedulePhase>, StoreError>> + Send;

    /// Writes one schedule row, guarded by the version the caller read.
    /// Fails with [`StoreError::StaleWrite`] if the stored version has moved
    /// on; on success the stored row carries `expected_version + 1`.
    fn update_schedule_phase(
        &self,
        phase: &SchedulePhase,
        expected_version: u64,
    ) -> impl Future<Output = Result<SchedulePhase, StoreError>> + Send;
}

//! Core domain types for the delivery workflow engine.
//!
//! This module contains all the fundamental types used throughout the
//! application, designed to encode invariants via the type system.

pub mod actor;
pub mod criterion;
pub mod ids;
pub mod phase;
pub mod project;
pub mod schedule;

// Re-export commonly used types at the module level
pub use actor::{Actor, Role, UnknownRole};
pub use criterion::EntryCriterion;
pub use ids::{CriterionId, PhaseKey, ProjectId};
pub use phase::{PhaseStatus, WorkflowPhaseInstance};
pub use project::Project;
pub use schedule::{span_days, SchedulePhase, ScheduleStatus};

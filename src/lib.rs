//! Stagegate: a workflow gate and schedule dependency engine.
//!
//! Projects walk a fixed catalog of phases in order. Each phase is guarded
//! by an entry-criteria gate and a role-based approver set; approving a
//! phase advances the project's phase pointer. Alongside the workflow, each
//! project carries a dated schedule linked by dependency edges: moving one
//! phase's end date cascades recalculated dates through every transitive
//! dependent.
//!
//! # Architecture
//!
//! The decision logic is pure and synchronous:
//!
//! - [`workflow`] - the phase state machine (start/approve decisions)
//! - [`criteria`] - gate evaluation and per-phase criteria templates
//! - [`schedule`] - dependency graph validation and date recalculation
//! - [`registry`] - the static phase catalog (order, approvers, gating)
//!
//! Around it sit the async layers:
//!
//! - [`store`] - the persistence trait and its in-memory implementation
//! - [`service`] - orchestration: load snapshot, decide, persist outcome
//! - [`server`] - the axum HTTP surface

pub mod criteria;
pub mod registry;
pub mod schedule;
pub mod server;
pub mod service;
pub mod store;
pub mod types;
pub mod workflow;

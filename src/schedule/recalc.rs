//! Schedule recalculation engine.
//!
//! Given one phase's edited end date, rewrites that phase and re-derives
//! every transitive dependent in topological order. The engine is a pure
//! function over a snapshot of the project's schedule rows: dates are always
//! derived fresh from dependency end dates, never incrementally adjusted, so
//! re-running with identical input produces an empty cascade.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use thiserror::Error;

use crate::schedule::busday::next_business_day_after;
use crate::schedule::graph::{GraphError, ScheduleGraph};
use crate::types::{span_days, PhaseKey, SchedulePhase, ScheduleStatus};

/// Errors from recalculation. All of these abort before any row changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecalcError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The new end date precedes the phase's (unchanged) start date.
    #[error("end date {end} for phase {phase} precedes its start {start}")]
    InvalidEndDate {
        phase: PhaseKey,
        start: NaiveDate,
        end: NaiveDate,
    },
}

/// The result of a recalculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecalcOutcome {
    /// Post-recalculation state of the edited phase.
    pub modified: SchedulePhase,

    /// True if the edited phase actually differs from its stored row.
    pub modified_changed: bool,

    /// Dependents whose dates or status changed, in topological order.
    pub cascade: Vec<SchedulePhase>,
}

impl RecalcOutcome {
    /// Number of dependent phases that changed (the edited phase itself is
    /// not counted).
    pub fn cascade_count(&self) -> usize {
        self.cascade.len()
    }

    /// Rows to persist, in write order: the edited phase first (when it
    /// changed), then the cascade.
    pub fn updated(&self) -> impl Iterator<Item = &SchedulePhase> {
        self.modified_changed
            .then_some(&self.modified)
            .into_iter()
            .chain(self.cascade.iter())
    }
}

/// Stateless recalculation engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecalcEngine;

impl RecalcEngine {
    pub fn new() -> Self {
        RecalcEngine
    }

    /// Recalculates the schedule after `modified_key`'s end date moves to
    /// `new_end`.
    ///
    /// The edited phase keeps its start; its duration is re-derived from the
    /// new span. Each dependent then slides with fixed duration:
    /// `start = first business day after max(dependency ends)` and
    /// `end = start + duration - 1`. A phase whose end lands later than its
    /// stored end is marked delayed; one that lands earlier has the delay
    /// flag cleared. `completed` status is never touched.
    ///
    /// Cycles and dangling dependencies abort before anything is computed.
    pub fn recalculate(
        &self,
        phases: &[SchedulePhase],
        modified_key: &PhaseKey,
        new_end: NaiveDate,
    ) -> Result<RecalcOutcome, RecalcError> {
        let graph = ScheduleGraph::build(phases)?;
        if let Some(cycle) = graph.detect_cycle() {
            return Err(GraphError::CyclicDependency(cycle).into());
        }
        graph.node(modified_key)?;

        let mut working: HashMap<PhaseKey, SchedulePhase> = phases
            .iter()
            .map(|p| (p.phase_key.clone(), p.clone()))
            .collect();

        // The edited phase: end moves, start stays, duration re-derived.
        let stored = &working[modified_key];
        if new_end < stored.start_date {
            return Err(RecalcError::InvalidEndDate {
                phase: modified_key.clone(),
                start: stored.start_date,
                end: new_end,
            });
        }

        let mut modified = stored.clone();
        modified.end_date = new_end;
        modified.duration_days = span_days(modified.start_date, new_end);
        modified.status = shift_status(modified.status, new_end, stored.end_date);
        let modified_changed = modified != *stored;
        working.insert(modified_key.clone(), modified.clone());

        // Dependents, in topological order so every phase sees its
        // dependencies' already-recalculated end dates.
        let mut cascade = Vec::new();
        for key in graph.transitive_dependents(modified_key)? {
            let stored = working[&key].clone();

            let latest_dep_end = stored
                .depends_on
                .iter()
                .filter_map(|dep| working.get(dep))
                .map(|dep| dep.end_date)
                .max()
                .unwrap_or(stored.start_date);

            let mut updated = stored.clone();
            updated.start_date = next_business_day_after(latest_dep_end);
            let duration = updated.duration_days.max(1);
            updated.end_date = updated.start_date + Days::new(u64::from(duration) - 1);
            updated.status = shift_status(stored.status, updated.end_date, stored.end_date);

            if updated != stored {
                cascade.push(updated.clone());
            }
            working.insert(key, updated);
        }

        Ok(RecalcOutcome {
            modified,
            modified_changed,
            cascade,
        })
    }
}

/// Delay marker policy: a later end marks the phase delayed, an earlier end
/// clears a previous delay, an unchanged end leaves the status alone.
/// Completed phases keep their status regardless of date shifts.
fn shift_status(current: ScheduleStatus, new_end: NaiveDate, stored_end: NaiveDate) -> ScheduleStatus {
    if current == ScheduleStatus::Completed {
        return ScheduleStatus::Completed;
    }
    if new_end > stored_end {
        ScheduleStatus::Delayed
    } else if new_end < stored_end {
        ScheduleStatus::Scheduled
    } else {
        current
    }
}

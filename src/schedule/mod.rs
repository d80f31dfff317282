//! Dependency-driven schedule management.
//!
//! A project's schedule is a set of dated phases linked by dependency edges.
//! [`graph`] validates the edge structure and orders recalculation,
//! [`busday`] holds the working-day calendar rules, and [`recalc`] derives
//! new dates for every phase downstream of an edit.

pub mod busday;
pub mod graph;
pub mod recalc;

pub use busday::{is_business_day, next_business_day_after};
pub use graph::{GraphError, ScheduleGraph};
pub use recalc::{RecalcEngine, RecalcError, RecalcOutcome};

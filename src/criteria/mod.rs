//! Entry-criteria gate and checklist templates.
//!
//! The gate is the pure core consulted by the state machine before approval;
//! templates seed a phase's checklist when it first starts.

pub mod gate;
pub mod template;

pub use gate::{evaluate, GateStatus};
pub use template::{instantiate, template_for, CriterionTemplate};

//! Pure workflow transition logic.
//!
//! This module contains the functional core of the approval side: the phase
//! state machine and its outcome types. All I/O and persistence are handled
//! by the service layer.

pub mod machine;

pub use machine::{ApproveOutcome, PhaseStateMachine, StartOutcome, WorkflowError};

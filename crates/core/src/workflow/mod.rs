//! Expense approval workflow for Outlay.
//!
//! This module implements the approval workflow data model, the rule
//! selection algorithm, the stage-advancement state machine, and the
//! time-based escalation policy.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (statuses, stages, expense, records)
//! - `error` - Workflow-specific error types
//! - `rules` - Approval rule catalog and rule selection
//! - `machine` - Stage-advancement state transition logic
//! - `escalation` - Time-based escalation policy

pub mod error;
pub mod escalation;
pub mod machine;
pub mod rules;
pub mod types;

#[cfg(test)]
mod machine_props;
#[cfg(test)]
mod rules_props;

pub use error::WorkflowError;
pub use escalation::EscalationPolicy;
pub use machine::{WorkflowMachine, WorkflowStep};
pub use rules::{ApprovalRule, RuleSelector};
pub use types::{
    Actor, ActorRole, ApprovalRecord, ApproverRole, Decision, Expense, ExpenseStatus,
    RecordStatus, Stage, TransitionResult,
};

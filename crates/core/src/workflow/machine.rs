//! Stage-advancement state machine for the expense workflow.
//!
//! All methods are pure: they validate a proposed transition against the
//! current expense state and return the resulting [`WorkflowStep`] without
//! mutating anything. The engine layer applies the step and the matching
//! approval record atomically.

use crate::workflow::error::WorkflowError;
use crate::workflow::rules::ApprovalRule;
use crate::workflow::types::{
    Actor, ActorRole, ApproverRole, Decision, Expense, ExpenseStatus, Stage,
};

/// The computed outcome of a workflow transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowStep {
    /// Status after the transition.
    pub status: ExpenseStatus,
    /// Stage after the transition.
    pub stage: Stage,
    /// Cursor after the transition.
    pub cursor: usize,
}

impl WorkflowStep {
    /// Returns true if the step terminates the workflow.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Stateless service computing expense workflow transitions.
pub struct WorkflowMachine;

impl WorkflowMachine {
    /// Computes the initial stage and cursor for a freshly submitted expense.
    ///
    /// With a matched rule the first sequence element is awaited; without a
    /// rule (or with an empty sequence) the expense falls back to a direct
    /// single-stage manager approval.
    #[must_use]
    pub fn initial_stage(rule: Option<&ApprovalRule>) -> (Stage, usize) {
        let first = rule
            .and_then(|r| r.sequence.first().copied())
            .unwrap_or(ApproverRole::Manager);
        (Stage::Awaiting(first), 0)
    }

    /// Computes the transition for an approve/reject action.
    ///
    /// Validates, in order and before any mutation: the expense is
    /// actionable, the actor belongs to the expense's company, the actor's
    /// role matches the awaited stage, and a rejection carries a comment.
    ///
    /// # Errors
    ///
    /// * [`WorkflowError::NotActionable`] if the expense is terminal
    /// * [`WorkflowError::WrongCompany`] on a cross-company action
    /// * [`WorkflowError::NotAuthorizedForStage`] on a role/stage mismatch
    /// * [`WorkflowError::CommentRequired`] on a reject without comment
    /// * [`WorkflowError::StageOutOfSync`] if the stored cursor disagrees
    ///   with the rule's sequence
    pub fn advance(
        expense: &Expense,
        rule: Option<&ApprovalRule>,
        actor: &Actor,
        decision: Decision,
        comment: Option<&str>,
    ) -> Result<WorkflowStep, WorkflowError> {
        let awaited = Self::check_actionable(expense, actor)?;

        if actor.role.approver_role() != Some(awaited) {
            return Err(WorkflowError::NotAuthorizedForStage {
                role: actor.role,
                stage: awaited,
            });
        }

        match decision {
            Decision::Reject => {
                if comment.is_none_or(|c| c.trim().is_empty()) {
                    return Err(WorkflowError::CommentRequired);
                }
                Ok(WorkflowStep {
                    status: ExpenseStatus::Rejected,
                    stage: Stage::Completed,
                    cursor: expense.stage_cursor,
                })
            }
            Decision::Approve => Self::approve_step(expense, rule, awaited),
        }
    }

    /// Computes the transition for an admin override.
    ///
    /// Overrides bypass the stage entirely: any non-terminal expense is
    /// forced to the requested terminal decision.
    ///
    /// # Errors
    ///
    /// * [`WorkflowError::AdminRequired`] if the actor is not an admin
    /// * [`WorkflowError::WrongCompany`] on a cross-company action
    /// * [`WorkflowError::NotActionable`] if the expense is terminal
    pub fn override_decision(
        expense: &Expense,
        actor: &Actor,
        decision: Decision,
    ) -> Result<WorkflowStep, WorkflowError> {
        if actor.role != ActorRole::Admin {
            return Err(WorkflowError::AdminRequired);
        }
        if actor.company_id != expense.company_id {
            return Err(WorkflowError::WrongCompany);
        }
        if !expense.status.is_actionable() {
            return Err(WorkflowError::NotActionable {
                status: expense.status,
            });
        }

        let status = match decision {
            Decision::Approve => ExpenseStatus::Approved,
            Decision::Reject => ExpenseStatus::Rejected,
        };
        Ok(WorkflowStep {
            status,
            stage: Stage::Completed,
            cursor: expense.stage_cursor,
        })
    }

    /// Shared pre-checks; returns the role the current stage awaits.
    fn check_actionable(expense: &Expense, actor: &Actor) -> Result<ApproverRole, WorkflowError> {
        if !expense.status.is_actionable() {
            return Err(WorkflowError::NotActionable {
                status: expense.status,
            });
        }
        if actor.company_id != expense.company_id {
            return Err(WorkflowError::WrongCompany);
        }
        // An actionable expense always awaits a concrete role; a completed
        // stage here means the stored state is inconsistent.
        expense
            .current_stage
            .awaited_role()
            .ok_or(WorkflowError::StageOutOfSync {
                cursor: expense.stage_cursor,
                sequence_len: 0,
            })
    }

    fn approve_step(
        expense: &Expense,
        rule: Option<&ApprovalRule>,
        awaited: ApproverRole,
    ) -> Result<WorkflowStep, WorkflowError> {
        // Escalation force-moves the stage to admin, possibly outside the
        // declared sequence; an admin approval there is terminal.
        if expense.escalated && awaited == ApproverRole::Admin {
            return Ok(WorkflowStep {
                status: ExpenseStatus::Approved,
                stage: Stage::Completed,
                cursor: expense.stage_cursor,
            });
        }

        let Some(rule) = rule else {
            // No rule attached: direct single-stage approval.
            return Ok(WorkflowStep {
                status: ExpenseStatus::Approved,
                stage: Stage::Completed,
                cursor: expense.stage_cursor,
            });
        };

        let cursor = expense.stage_cursor;
        // The cursor is authoritative for the sequence position. A cursor
        // that points outside the sequence, or at a different role than the
        // stage awaits, is surfaced instead of restarting the workflow.
        if rule.sequence.get(cursor) != Some(&awaited) {
            return Err(WorkflowError::StageOutOfSync {
                cursor,
                sequence_len: rule.sequence.len(),
            });
        }

        if cursor + 1 < rule.sequence.len() {
            Ok(WorkflowStep {
                status: ExpenseStatus::InProgress,
                stage: Stage::Awaiting(rule.sequence[cursor + 1]),
                cursor: cursor + 1,
            })
        } else {
            Ok(WorkflowStep {
                status: ExpenseStatus::Approved,
                stage: Stage::Completed,
                cursor,
            })
        }
    }
}

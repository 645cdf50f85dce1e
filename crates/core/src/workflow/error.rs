//! Workflow error types for expense lifecycle management.
//!
//! Every workflow operation surfaces failures through [`WorkflowError`]
//! rather than raising uncaught faults past the engine boundary. Each
//! variant carries an HTTP status code and a stable error code so the
//! (out-of-scope) API layer can map errors mechanically.

use thiserror::Error;

use outlay_shared::{ApprovalRuleId, ExpenseId};

use crate::workflow::types::{ActorRole, ApproverRole, ExpenseStatus};

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The expense has already reached a terminal decision or is otherwise
    /// not actionable.
    #[error("Expense is not actionable in status {status}")]
    NotActionable {
        /// The expense's current status.
        status: ExpenseStatus,
    },

    /// The actor's role does not match the stage currently awaiting approval.
    #[error("Role {role} is not authorized to act at the {stage} stage")]
    NotAuthorizedForStage {
        /// The actor's role.
        role: ActorRole,
        /// The role the current stage awaits.
        stage: ApproverRole,
    },

    /// Override requested by a non-admin actor.
    #[error("Only admins can override an expense workflow")]
    AdminRequired,

    /// The actor belongs to a different company than the expense.
    #[error("Actor does not belong to the expense's company")]
    WrongCompany,

    /// Reject requires a non-blank comment.
    #[error("Rejection comment is required")]
    CommentRequired,

    /// Expense not found.
    #[error("Expense {0} not found")]
    ExpenseNotFound(ExpenseId),

    /// Approval rule not found.
    #[error("Approval rule {0} not found")]
    RuleNotFound(ApprovalRuleId),

    /// The expense's stage cursor disagrees with the rule's declared
    /// sequence. Surfaced explicitly instead of restarting the workflow.
    #[error("Stage cursor {cursor} is out of sync with a sequence of length {sequence_len}")]
    StageOutOfSync {
        /// The stored cursor.
        cursor: usize,
        /// The length of the rule's stage sequence.
        sequence_len: usize,
    },

    /// A concurrent writer updated the expense first (version mismatch).
    #[error("Expense {0} was concurrently modified")]
    Conflict(ExpenseId),

    /// Store error.
    #[error("Store error: {0}")]
    Store(String),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotActionable { .. } | Self::CommentRequired => 400,
            Self::NotAuthorizedForStage { .. } | Self::AdminRequired | Self::WrongCompany => 403,
            Self::ExpenseNotFound(_) | Self::RuleNotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::StageOutOfSync { .. } | Self::Store(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotActionable { .. } => "EXPENSE_NOT_ACTIONABLE",
            Self::NotAuthorizedForStage { .. } => "NOT_AUTHORIZED_FOR_STAGE",
            Self::AdminRequired => "ADMIN_REQUIRED",
            Self::WrongCompany => "WRONG_COMPANY",
            Self::CommentRequired => "REJECTION_COMMENT_REQUIRED",
            Self::ExpenseNotFound(_) => "EXPENSE_NOT_FOUND",
            Self::RuleNotFound(_) => "APPROVAL_RULE_NOT_FOUND",
            Self::StageOutOfSync { .. } => "STAGE_OUT_OF_SYNC",
            Self::Conflict(_) => "CONCURRENT_UPDATE",
            Self::Store(_) => "STORE_ERROR",
        }
    }
}

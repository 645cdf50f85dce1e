//! Workflow domain types for expense lifecycle management.
//!
//! This module defines the data model the approval workflow operates on:
//! expense statuses, approval stages, the expense entity itself, and the
//! append-only approval record that forms the audit trail.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use outlay_shared::{
    ApprovalRecordId, ApprovalRuleId, CompanyId, CurrencyCode, ExpenseId, UserId, UserSetId,
};

/// Expense status in the approval workflow.
///
/// Expenses progress through these states from submission to a terminal
/// decision. The valid transitions are:
/// - Pending → InProgress (first approval of a multi-stage sequence)
/// - Pending → Approved (single-stage approval or override)
/// - Pending → Rejected (reject or override)
/// - InProgress → Approved (sequence exhausted or override)
/// - InProgress → Rejected (reject or override)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    /// Submitted and awaiting the first approval.
    Pending,
    /// Mid-sequence: at least one stage approved, more remain.
    InProgress,
    /// Fully approved (terminal).
    Approved,
    /// Rejected (terminal).
    Rejected,
}

impl ExpenseStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if the workflow can still act on the expense.
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    /// Returns true if the expense has reached a terminal decision.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A role whose approval a stage requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApproverRole {
    /// The expense owner's set manager.
    Manager,
    /// A company admin.
    Admin,
}

impl ApproverRole {
    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "manager" => Some(Self::Manager),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for ApproverRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The role of the acting user, supplied by the (out-of-scope) auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    /// Submits expenses; cannot approve.
    Employee,
    /// Approves at the manager stage for their set.
    Manager,
    /// Approves at the admin stage; may override.
    Admin,
}

impl ActorRole {
    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "employee" => Some(Self::Employee),
            "manager" => Some(Self::Manager),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Returns the approval stage this role may act at, if any.
    #[must_use]
    pub const fn approver_role(&self) -> Option<ApproverRole> {
        match self {
            Self::Employee => None,
            Self::Manager => Some(ApproverRole::Manager),
            Self::Admin => Some(ApproverRole::Admin),
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The approval stage an expense currently sits at.
///
/// A closed variant rather than a free-text role name: every value is either
/// a concrete awaited role or the completed sentinel, validated against the
/// rule's declared sequence at transition time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Awaiting approval from the given role.
    Awaiting(ApproverRole),
    /// The workflow has terminated; no further approval is awaited.
    Completed,
}

impl Stage {
    /// Returns the string representation of the stage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Awaiting(role) => role.as_str(),
            Self::Completed => "completed",
        }
    }

    /// Parses a stage from a string.
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("completed") {
            return Some(Self::Completed);
        }
        ApproverRole::parse(s).map(Self::Awaiting)
    }

    /// Returns the awaited role, if the stage is not completed.
    #[must_use]
    pub const fn awaited_role(&self) -> Option<ApproverRole> {
        match self {
            Self::Awaiting(role) => Some(*role),
            Self::Completed => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Stage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Stage {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("unknown stage: {s}")))
    }
}

/// An approval action taken by an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Approve the current stage.
    Approve,
    /// Reject the expense outright.
    Reject,
}

impl Decision {
    /// Returns the string representation of the decision.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status recorded on an approval record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Stage entered but not yet decided.
    Pending,
    /// The stage was approved.
    Approved,
    /// The expense was rejected at this stage.
    Rejected,
    /// An admin override terminated the workflow.
    Overridden,
}

impl RecordStatus {
    /// Returns the string representation of the record status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Overridden => "overridden",
        }
    }
}

impl From<Decision> for RecordStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approve => Self::Approved,
            Decision::Reject => Self::Rejected,
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The acting user context, supplied by the caller per operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The acting user.
    pub id: UserId,
    /// The actor's role within their company.
    pub role: ActorRole,
    /// The company the actor belongs to.
    pub company_id: CompanyId,
    /// The manager-led set the actor belongs to, if any.
    pub user_set_id: Option<UserSetId>,
}

/// An expense routed through the approval workflow.
///
/// `status`, `current_stage`, `stage_cursor`, `escalation_date`, `escalated`
/// and the decision fields are mutated exclusively by the workflow engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    /// Unique identifier.
    pub id: ExpenseId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Submitting user (owner).
    pub user_id: UserId,
    /// Short human-readable title.
    pub title: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Submitted amount in the submitted currency.
    pub amount: Decimal,
    /// Currency the expense was submitted in.
    pub currency: CurrencyCode,
    /// Amount normalized into the company's base currency.
    pub base_amount: Decimal,
    /// Workflow status.
    pub status: ExpenseStatus,
    /// The stage currently awaiting approval.
    pub current_stage: Stage,
    /// Explicit index into the rule's sequence for the current stage.
    pub stage_cursor: usize,
    /// The rule selected at submission, if any matched.
    pub approval_rule: Option<ApprovalRuleId>,
    /// Urgency flag set at submission.
    pub urgent: bool,
    /// When the expense becomes eligible for escalation.
    pub escalation_date: Option<DateTime<Utc>>,
    /// Whether the escalation sweep has already promoted this expense.
    pub escalated: bool,
    /// The actor whose decision terminated the workflow.
    pub approved_by: Option<UserId>,
    /// When the terminal decision was made.
    pub approved_at: Option<DateTime<Utc>>,
    /// Comment supplied with a rejection.
    pub rejection_reason: Option<String>,
    /// When the expense was submitted.
    pub submitted_at: DateTime<Utc>,
    /// Optimistic-concurrency counter, bumped on every mutation.
    pub version: u64,
}

impl Expense {
    /// Returns true if the expense has reached a terminal decision.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Immutable audit-trail entry, appended once per workflow action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRecord {
    /// Unique identifier.
    pub id: ApprovalRecordId,
    /// The expense this record belongs to.
    pub expense_id: ExpenseId,
    /// The acting user.
    pub approver: UserId,
    /// The actor's role at the time of the action.
    pub role: ActorRole,
    /// The outcome recorded for this action.
    pub status: RecordStatus,
    /// Optional comment supplied with the action.
    pub comment: Option<String>,
    /// When the recorded action was decided.
    pub approved_at: Option<DateTime<Utc>>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// Result descriptor returned by every successful workflow transition.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionResult {
    /// The expense acted on.
    pub expense_id: ExpenseId,
    /// Status after the transition.
    pub status: ExpenseStatus,
    /// Stage after the transition.
    pub current_stage: Stage,
    /// Display name of the next approver, if the workflow continues.
    pub next_approver: Option<String>,
    /// The audit record created by this transition.
    pub approval_record_id: ApprovalRecordId,
}

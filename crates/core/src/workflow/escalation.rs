//! Time-based escalation policy.
//!
//! An expense that sits unactioned past its escalation date is force-
//! promoted to the admin stage. The sweep itself lives in the engine; this
//! module owns the pure policy: scheduling the window, deciding dueness,
//! and computing the forced promotion.

use chrono::{DateTime, Duration, Utc};

use outlay_shared::config::EscalationConfig;

use crate::workflow::types::{ApproverRole, Expense, ExpenseStatus, Stage};

/// Default escalation window in hours (fixed SLA, not per-rule).
pub const DEFAULT_WINDOW_HOURS: i64 = 48;

/// Escalation policy with a configurable window.
#[derive(Debug, Clone, Copy)]
pub struct EscalationPolicy {
    window: Duration,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_HOURS)
    }
}

impl EscalationPolicy {
    /// Creates a policy with the given window in hours.
    #[must_use]
    pub fn new(window_hours: i64) -> Self {
        Self {
            window: Duration::hours(window_hours),
        }
    }

    /// Creates a policy from configuration.
    #[must_use]
    pub fn from_config(config: &EscalationConfig) -> Self {
        Self::new(config.window_hours)
    }

    /// Computes the escalation date for an expense submitted at `now`.
    #[must_use]
    pub fn schedule(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.window
    }

    /// Returns true if the expense is due for escalation at `now`.
    ///
    /// The `escalated` flag makes the sweep idempotent per expense: a swept
    /// expense is never due again.
    #[must_use]
    pub fn is_due(expense: &Expense, now: DateTime<Utc>) -> bool {
        !expense.escalated
            && expense.status.is_actionable()
            && expense.escalation_date.is_some_and(|date| date <= now)
    }

    /// Applies the forced promotion to the admin stage.
    ///
    /// The cursor is left untouched: escalation may move the stage outside
    /// the rule's declared sequence, and the state machine treats an
    /// escalated expense awaiting admin as terminal on approval.
    pub fn escalate(expense: &mut Expense) {
        expense.current_stage = Stage::Awaiting(ApproverRole::Admin);
        expense.escalated = true;
        expense.status = ExpenseStatus::InProgress;
    }
}

//! The expense workflow service.
//!
//! Orchestrates submission, approval advancement, admin override, the
//! escalation sweep and pending-queue listing over the injected store
//! traits. All transition logic lives in `outlay-core`; this service adds
//! persistence, currency normalization, approver resolution and logging.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use outlay_core::workflow::{
    Actor, ActorRole, ApprovalRecord, ApprovalRule, ApproverRole, Decision, EscalationPolicy,
    Expense, ExpenseStatus, RecordStatus, RuleSelector, TransitionResult, WorkflowError,
    WorkflowMachine, WorkflowStep,
};
use outlay_shared::{ApprovalRecordId, CurrencyCode, ExpenseId};

use crate::rates::CurrencyNormalizer;
use crate::store::{CompanyDirectory, RuleCatalog, StoreError, WorkflowStore};

/// Placeholder shown when the manager stage has no assigned manager.
const MANAGER_NOT_ASSIGNED: &str = "Manager (Not Assigned)";
/// Placeholder shown when the company has no admin on record.
const ADMIN_NOT_FOUND: &str = "Admin (Not Found)";

/// A new expense as submitted by an employee.
#[derive(Debug, Clone)]
pub struct ExpenseDraft {
    /// Short human-readable title.
    pub title: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Amount in the submitted currency.
    pub amount: Decimal,
    /// Currency the amount is denominated in.
    pub currency: CurrencyCode,
    /// Urgency flag; urgent expenses take the bypass rule if one exists.
    pub urgent: bool,
}

/// Workflow operations over injected stores.
pub struct ExpenseService {
    store: Arc<dyn WorkflowStore>,
    rules: Arc<dyn RuleCatalog>,
    directory: Arc<dyn CompanyDirectory>,
    normalizer: CurrencyNormalizer,
    escalation: EscalationPolicy,
}

impl ExpenseService {
    /// Creates the service over its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        rules: Arc<dyn RuleCatalog>,
        directory: Arc<dyn CompanyDirectory>,
        normalizer: CurrencyNormalizer,
        escalation: EscalationPolicy,
    ) -> Self {
        Self {
            store,
            rules,
            directory,
            normalizer,
            escalation,
        }
    }

    /// Submits a new expense on behalf of `actor`.
    ///
    /// Normalizes the amount into the company's base currency, selects the
    /// applicable approval rule, computes the initial stage and schedules
    /// the escalation deadline.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the insert.
    pub async fn submit(
        &self,
        draft: ExpenseDraft,
        actor: &Actor,
    ) -> Result<Expense, WorkflowError> {
        let now = Utc::now();
        let base = self.directory.base_currency(actor.company_id).await?;
        let base_amount = self
            .normalizer
            .convert(draft.amount, &draft.currency, &base)
            .await;

        let catalog = self.rules.active_rules(actor.company_id).await?;
        let rule = RuleSelector::select(&catalog, base_amount, draft.urgent);
        let (stage, cursor) = WorkflowMachine::initial_stage(rule);

        let expense = Expense {
            id: ExpenseId::new(),
            company_id: actor.company_id,
            user_id: actor.id,
            title: draft.title,
            description: draft.description,
            amount: draft.amount,
            currency: draft.currency,
            base_amount,
            status: ExpenseStatus::Pending,
            current_stage: stage,
            stage_cursor: cursor,
            approval_rule: rule.map(|r| r.id),
            urgent: draft.urgent,
            escalation_date: Some(self.escalation.schedule(now)),
            escalated: false,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            submitted_at: now,
            version: 0,
        };
        self.store.insert_expense(expense.clone()).await?;

        info!(
            expense = %expense.id,
            company = %expense.company_id,
            rule = rule.map(|r| r.name.as_str()),
            stage = %expense.current_stage,
            urgent = expense.urgent,
            "expense submitted"
        );
        Ok(expense)
    }

    /// Records an approve/reject decision and advances the workflow.
    ///
    /// The approval record and the expense mutation persist atomically;
    /// on success the caller learns the resulting status, stage and next
    /// approver.
    ///
    /// # Errors
    ///
    /// Surfaces state-machine violations (not actionable, wrong role or
    /// company, missing rejection comment), missing entities, and
    /// concurrent-update conflicts.
    pub async fn advance(
        &self,
        expense_id: ExpenseId,
        actor: &Actor,
        decision: Decision,
        comment: Option<&str>,
    ) -> Result<TransitionResult, WorkflowError> {
        let expense = self.require_expense(expense_id).await?;
        let rule = self.rule_for(&expense).await?;

        let step = WorkflowMachine::advance(&expense, rule.as_ref(), actor, decision, comment)?;
        let now = Utc::now();
        let record = ApprovalRecord {
            id: ApprovalRecordId::new(),
            expense_id,
            approver: actor.id,
            role: actor.role,
            status: RecordStatus::from(decision),
            comment: comment.map(str::to_string),
            approved_at: Some(now),
            created_at: now,
        };
        let updated = apply_step(expense, &step, actor, comment, now);
        self.store
            .apply_transition(updated.clone(), record.clone())
            .await?;

        let next_approver = self.resolve_next_approver(&updated).await?;
        info!(
            expense = %expense_id,
            actor = %actor.id,
            decision = %decision,
            status = %updated.status,
            stage = %updated.current_stage,
            "workflow advanced"
        );
        Ok(TransitionResult {
            expense_id,
            status: updated.status,
            current_stage: updated.current_stage,
            next_approver,
            approval_record_id: record.id,
        })
    }

    /// Terminates the workflow immediately with an admin decision,
    /// bypassing any remaining stages.
    ///
    /// # Errors
    ///
    /// Surfaces authorization failures, missing expenses, non-actionable
    /// expenses and concurrent-update conflicts.
    pub async fn override_expense(
        &self,
        expense_id: ExpenseId,
        actor: &Actor,
        decision: Decision,
        comment: Option<&str>,
    ) -> Result<TransitionResult, WorkflowError> {
        let expense = self.require_expense(expense_id).await?;
        let step = WorkflowMachine::override_decision(&expense, actor, decision)?;

        let now = Utc::now();
        let record = ApprovalRecord {
            id: ApprovalRecordId::new(),
            expense_id,
            approver: actor.id,
            role: actor.role,
            status: RecordStatus::Overridden,
            comment: comment.map(str::to_string),
            approved_at: Some(now),
            created_at: now,
        };
        let updated = apply_step(expense, &step, actor, comment, now);
        self.store
            .apply_transition(updated.clone(), record.clone())
            .await?;

        info!(
            expense = %expense_id,
            admin = %actor.id,
            decision = %decision,
            "workflow overridden"
        );
        Ok(TransitionResult {
            expense_id,
            status: updated.status,
            current_stage: updated.current_stage,
            next_approver: None,
            approval_record_id: record.id,
        })
    }

    /// Escalates every expense whose deadline has passed, as of now.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails; conflicts on individual
    /// expenses are skipped, not fatal.
    pub async fn sweep_escalations(&self) -> Result<usize, WorkflowError> {
        self.sweep_escalations_at(Utc::now()).await
    }

    /// Escalation sweep with an explicit clock, for schedulers and tests.
    ///
    /// Idempotent: an already escalated expense is never picked up again,
    /// so a crashed sweep can simply be re-run.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails; conflicts on individual
    /// expenses are skipped, not fatal.
    pub async fn sweep_escalations_at(&self, now: DateTime<Utc>) -> Result<usize, WorkflowError> {
        let due = self.store.due_for_escalation(now).await?;
        let mut escalated = 0usize;
        for mut expense in due {
            let id = expense.id;
            EscalationPolicy::escalate(&mut expense);
            expense.version += 1;
            match self.store.update_expense(expense).await {
                Ok(()) => escalated += 1,
                // Someone acted on it between the query and the write;
                // the next sweep re-evaluates it.
                Err(StoreError::Conflict(_)) => {
                    warn!(expense = %id, "skipping escalation, expense changed concurrently");
                }
                Err(err) => return Err(err.into()),
            }
        }
        info!(count = escalated, "escalation sweep finished");
        Ok(escalated)
    }

    /// Lists the expenses awaiting the actor's attention.
    ///
    /// Employees see their own open expenses, managers the manager-stage
    /// queue for their direct reports, admins the company's admin-stage
    /// queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the store or directory fails.
    pub async fn list_pending(&self, actor: &Actor) -> Result<Vec<Expense>, WorkflowError> {
        match actor.role {
            ActorRole::Employee => {
                let mut own = self.store.owned_by(actor.id).await?;
                own.retain(|e| e.status.is_actionable());
                Ok(own)
            }
            ActorRole::Manager => {
                let queue = self
                    .store
                    .awaiting_stage(actor.company_id, ApproverRole::Manager)
                    .await?;
                let mut mine = Vec::new();
                for expense in queue {
                    let manager = self.directory.manager_of(expense.user_id).await?;
                    if manager.is_some_and(|m| m.id == actor.id) {
                        mine.push(expense);
                    }
                }
                Ok(mine)
            }
            ActorRole::Admin => Ok(self
                .store
                .awaiting_stage(actor.company_id, ApproverRole::Admin)
                .await?),
        }
    }

    async fn require_expense(&self, id: ExpenseId) -> Result<Expense, WorkflowError> {
        self.store
            .find_expense(id)
            .await?
            .ok_or(WorkflowError::ExpenseNotFound(id))
    }

    async fn rule_for(&self, expense: &Expense) -> Result<Option<ApprovalRule>, WorkflowError> {
        match expense.approval_rule {
            Some(rule_id) => {
                let rule = self
                    .rules
                    .find_rule(rule_id)
                    .await?
                    .ok_or(WorkflowError::RuleNotFound(rule_id))?;
                Ok(Some(rule))
            }
            None => Ok(None),
        }
    }

    /// Resolves the display name of whoever the expense now awaits.
    async fn resolve_next_approver(
        &self,
        expense: &Expense,
    ) -> Result<Option<String>, WorkflowError> {
        let Some(awaited) = expense.current_stage.awaited_role() else {
            return Ok(None);
        };
        let name = match awaited {
            ApproverRole::Manager => self
                .directory
                .manager_of(expense.user_id)
                .await?
                .map_or_else(|| MANAGER_NOT_ASSIGNED.to_string(), |m| m.username),
            ApproverRole::Admin => self
                .directory
                .company_admin(expense.company_id)
                .await?
                .map_or_else(|| ADMIN_NOT_FOUND.to_string(), |a| a.username),
        };
        Ok(Some(name))
    }
}

/// Copies a computed transition onto the expense and bumps its version.
fn apply_step(
    mut expense: Expense,
    step: &WorkflowStep,
    actor: &Actor,
    comment: Option<&str>,
    now: DateTime<Utc>,
) -> Expense {
    expense.status = step.status;
    expense.current_stage = step.stage;
    expense.stage_cursor = step.cursor;
    if step.is_terminal() {
        expense.approved_by = Some(actor.id);
        expense.approved_at = Some(now);
    }
    if step.status == ExpenseStatus::Rejected {
        expense.rejection_reason = comment.map(str::to_string);
    }
    expense.version += 1;
    expense
}

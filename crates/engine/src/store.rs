//! Repository traits the engine is written against.
//!
//! Persistence is an external collaborator: callers hand the service
//! implementations of these traits and the engine never sees a database.
//! [`crate::memory::InMemoryStore`] implements all three for tests and
//! embedded use.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use outlay_core::workflow::{ApprovalRecord, ApprovalRule, ApproverRole, Expense, WorkflowError};
use outlay_shared::{ApprovalRuleId, CompanyId, CurrencyCode, ExpenseId, UserId};

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An optimistic-lock write lost the race: the stored version no longer
    /// matches the version the caller read.
    #[error("concurrent update on expense {0}")]
    Conflict(ExpenseId),

    /// Any other backend failure (connectivity, corruption, ...).
    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(id) => Self::Conflict(id),
            StoreError::Backend(msg) => Self::Store(msg),
        }
    }
}

/// Expense persistence with optimistic concurrency control.
///
/// Write contract: callers pass an [`Expense`] whose `version` has already
/// been incremented. The store must reject the write with
/// [`StoreError::Conflict`] unless the stored version equals `version - 1`.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Persists a newly submitted expense. Inserting an id that already
    /// exists is a backend error, never an overwrite.
    async fn insert_expense(&self, expense: Expense) -> Result<(), StoreError>;

    /// Fetches one expense by id.
    async fn find_expense(&self, id: ExpenseId) -> Result<Option<Expense>, StoreError>;

    /// Updates an expense under the version check described on the trait.
    async fn update_expense(&self, expense: Expense) -> Result<(), StoreError>;

    /// Applies a decision atomically: the approval record append and the
    /// expense update both persist, or neither does. Same version check as
    /// [`Self::update_expense`].
    async fn apply_transition(
        &self,
        expense: Expense,
        record: ApprovalRecord,
    ) -> Result<(), StoreError>;

    /// All approval records for one expense, oldest first.
    async fn records_for(&self, expense: ExpenseId) -> Result<Vec<ApprovalRecord>, StoreError>;

    /// Actionable expenses in a company currently awaiting the given role.
    async fn awaiting_stage(
        &self,
        company: CompanyId,
        stage: ApproverRole,
    ) -> Result<Vec<Expense>, StoreError>;

    /// All expenses submitted by one user.
    async fn owned_by(&self, user: UserId) -> Result<Vec<Expense>, StoreError>;

    /// Actionable, not-yet-escalated expenses whose escalation date has
    /// passed as of `now`.
    async fn due_for_escalation(&self, now: DateTime<Utc>) -> Result<Vec<Expense>, StoreError>;
}

/// Read access to a company's approval rule catalog.
#[async_trait]
pub trait RuleCatalog: Send + Sync {
    /// Active rules for a company, in catalog order.
    async fn active_rules(&self, company: CompanyId) -> Result<Vec<ApprovalRule>, StoreError>;

    /// Fetches one rule by id, active or not.
    async fn find_rule(&self, id: ApprovalRuleId) -> Result<Option<ApprovalRule>, StoreError>;
}

/// A user reference resolved from the directory, for display purposes.
#[derive(Debug, Clone)]
pub struct UserRef {
    /// The user's id.
    pub id: UserId,
    /// The user's display name.
    pub username: String,
}

/// Org-structure lookups the engine needs to route and display approvers.
#[async_trait]
pub trait CompanyDirectory: Send + Sync {
    /// The manager responsible for a user's team, if assigned.
    async fn manager_of(&self, user: UserId) -> Result<Option<UserRef>, StoreError>;

    /// A company's admin, if one exists.
    async fn company_admin(&self, company: CompanyId) -> Result<Option<UserRef>, StoreError>;

    /// The company's base currency for amount normalization.
    async fn base_currency(&self, company: CompanyId) -> Result<CurrencyCode, StoreError>;
}

//! In-memory store implementation.
//!
//! Backs the integration tests and lets the engine run embedded without a
//! database. A single mutex guards all tables, so `apply_transition` is
//! trivially atomic.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use outlay_core::workflow::{
    ApprovalRecord, ApprovalRule, ApproverRole, EscalationPolicy, Expense, Stage,
};
use outlay_core::workflow::types::ActorRole;
use outlay_shared::{ApprovalRuleId, CompanyId, CurrencyCode, ExpenseId, UserId, UserSetId};

use crate::store::{CompanyDirectory, RuleCatalog, StoreError, UserRef, WorkflowStore};

/// A user seeded into the in-memory directory.
#[derive(Debug, Clone)]
pub struct UserSeed {
    /// The user's id.
    pub id: UserId,
    /// Display name.
    pub username: String,
    /// The user's role.
    pub role: ActorRole,
    /// The company the user belongs to.
    pub company_id: CompanyId,
    /// The manager-led set the user belongs to, if any.
    pub user_set_id: Option<UserSetId>,
}

#[derive(Default)]
struct Inner {
    expenses: HashMap<ExpenseId, Expense>,
    records: Vec<ApprovalRecord>,
    rules: HashMap<CompanyId, Vec<ApprovalRule>>,
    users: Vec<UserSeed>,
    set_managers: HashMap<UserSetId, UserId>,
    base_currencies: HashMap<CompanyId, CurrencyCode>,
}

/// In-memory implementation of all three store traits.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets a company's base currency.
    pub fn seed_company(&self, company: CompanyId, base_currency: CurrencyCode) {
        self.lock().base_currencies.insert(company, base_currency);
    }

    /// Appends rules to a company's catalog, preserving order.
    pub fn seed_rules(&self, company: CompanyId, rules: Vec<ApprovalRule>) {
        self.lock().rules.entry(company).or_default().extend(rules);
    }

    /// Registers a user in the directory.
    pub fn seed_user(&self, user: UserSeed) {
        self.lock().users.push(user);
    }

    /// Assigns a manager to a user set.
    pub fn seed_set_manager(&self, set: UserSetId, manager: UserId) {
        self.lock().set_managers.insert(set, manager);
    }
}

/// Checks the optimistic-lock contract: the incoming expense's version must
/// be exactly one ahead of the stored version.
fn check_version(inner: &Inner, expense: &Expense) -> Result<(), StoreError> {
    let Some(stored) = inner.expenses.get(&expense.id) else {
        return Err(StoreError::Backend(format!(
            "expense {} not found for update",
            expense.id
        )));
    };
    if stored.version + 1 == expense.version {
        Ok(())
    } else {
        Err(StoreError::Conflict(expense.id))
    }
}

#[async_trait]
impl WorkflowStore for InMemoryStore {
    async fn insert_expense(&self, expense: Expense) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.expenses.contains_key(&expense.id) {
            return Err(StoreError::Backend(format!(
                "expense {} already exists",
                expense.id
            )));
        }
        inner.expenses.insert(expense.id, expense);
        Ok(())
    }

    async fn find_expense(&self, id: ExpenseId) -> Result<Option<Expense>, StoreError> {
        Ok(self.lock().expenses.get(&id).cloned())
    }

    async fn update_expense(&self, expense: Expense) -> Result<(), StoreError> {
        let mut inner = self.lock();
        check_version(&inner, &expense)?;
        inner.expenses.insert(expense.id, expense);
        Ok(())
    }

    async fn apply_transition(
        &self,
        expense: Expense,
        record: ApprovalRecord,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        check_version(&inner, &expense)?;
        inner.expenses.insert(expense.id, expense);
        inner.records.push(record);
        Ok(())
    }

    async fn records_for(&self, expense: ExpenseId) -> Result<Vec<ApprovalRecord>, StoreError> {
        Ok(self
            .lock()
            .records
            .iter()
            .filter(|r| r.expense_id == expense)
            .cloned()
            .collect())
    }

    async fn awaiting_stage(
        &self,
        company: CompanyId,
        stage: ApproverRole,
    ) -> Result<Vec<Expense>, StoreError> {
        Ok(self
            .lock()
            .expenses
            .values()
            .filter(|e| {
                e.company_id == company
                    && e.status.is_actionable()
                    && e.current_stage == Stage::Awaiting(stage)
            })
            .cloned()
            .collect())
    }

    async fn owned_by(&self, user: UserId) -> Result<Vec<Expense>, StoreError> {
        Ok(self
            .lock()
            .expenses
            .values()
            .filter(|e| e.user_id == user)
            .cloned()
            .collect())
    }

    async fn due_for_escalation(&self, now: DateTime<Utc>) -> Result<Vec<Expense>, StoreError> {
        Ok(self
            .lock()
            .expenses
            .values()
            .filter(|e| EscalationPolicy::is_due(e, now))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RuleCatalog for InMemoryStore {
    async fn active_rules(&self, company: CompanyId) -> Result<Vec<ApprovalRule>, StoreError> {
        Ok(self
            .lock()
            .rules
            .get(&company)
            .map(|rules| rules.iter().filter(|r| r.is_active).cloned().collect())
            .unwrap_or_default())
    }

    async fn find_rule(&self, id: ApprovalRuleId) -> Result<Option<ApprovalRule>, StoreError> {
        Ok(self
            .lock()
            .rules
            .values()
            .flatten()
            .find(|r| r.id == id)
            .cloned())
    }
}

#[async_trait]
impl CompanyDirectory for InMemoryStore {
    async fn manager_of(&self, user: UserId) -> Result<Option<UserRef>, StoreError> {
        let inner = self.lock();
        let Some(set) = inner
            .users
            .iter()
            .find(|u| u.id == user)
            .and_then(|u| u.user_set_id)
        else {
            return Ok(None);
        };
        let Some(manager_id) = inner.set_managers.get(&set) else {
            return Ok(None);
        };
        Ok(inner.users.iter().find(|u| u.id == *manager_id).map(|u| UserRef {
            id: u.id,
            username: u.username.clone(),
        }))
    }

    async fn company_admin(&self, company: CompanyId) -> Result<Option<UserRef>, StoreError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.company_id == company && u.role == ActorRole::Admin)
            .map(|u| UserRef {
                id: u.id,
                username: u.username.clone(),
            }))
    }

    async fn base_currency(&self, company: CompanyId) -> Result<CurrencyCode, StoreError> {
        Ok(self
            .lock()
            .base_currencies
            .get(&company)
            .cloned()
            .unwrap_or_else(|| CurrencyCode::new("USD")))
    }
}

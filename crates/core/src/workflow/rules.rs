//! Approval rule catalog and rule selection.
//!
//! Rules are amount-banded per company; selection is stateless over a
//! caller-supplied slice so the catalog can be injected (and substituted in
//! tests) rather than looked up ambiently.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use outlay_shared::{ApprovalRuleId, CompanyId};

use crate::workflow::types::{ActorRole, ApprovalRecord, ApproverRole, RecordStatus};

/// An amount-banded approval rule.
///
/// Amount bounds are inclusive on both ends; a `None` upper bound is
/// unbounded. Within a company the last active rule should carry
/// `max_amount = None` so no amount falls through the ladder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRule {
    /// Unique identifier.
    pub id: ApprovalRuleId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Human-readable name.
    pub name: String,
    /// Minimum amount for this rule to apply (inclusive).
    pub min_amount: Decimal,
    /// Maximum amount for this rule to apply (inclusive, None = unbounded).
    pub max_amount: Option<Decimal>,
    /// Ordered list of stages an expense must clear.
    pub sequence: Vec<ApproverRole>,
    /// Share of approvers (1-100) that must approve. The current stage
    /// sequences each have a single approver, so advancement is per-stage;
    /// the field participates in the data model and the audit helper.
    pub percentage_required: u8,
    /// Whether admins may override expenses under this rule.
    pub admin_override: bool,
    /// Whether urgency skips the amount ladder to this rule.
    pub urgent_bypass: bool,
    /// Inactive rules never match.
    pub is_active: bool,
}

impl ApprovalRule {
    /// Returns true if the rule's amount band contains `amount`.
    #[must_use]
    pub fn matches_amount(&self, amount: Decimal) -> bool {
        self.min_amount <= amount && self.max_amount.is_none_or(|max| amount <= max)
    }
}

/// Stateless selector picking the single applicable rule for an expense.
pub struct RuleSelector;

impl RuleSelector {
    /// Selects the applicable rule for a normalized amount.
    ///
    /// Urgency always wins over amount-banding when an active bypass rule
    /// exists; this skips the amount ladder entirely, it is not a tie-break.
    /// Otherwise the active rule with the lowest matching `min_amount` wins;
    /// overlapping bands resolve by that same ascending-floor tie-break.
    ///
    /// Returns `None` when nothing matches; the caller treats that as "no
    /// workflow applicable" and falls back to direct single-stage approval.
    #[must_use]
    pub fn select(rules: &[ApprovalRule], amount: Decimal, urgent: bool) -> Option<&ApprovalRule> {
        if urgent
            && let Some(rule) = rules.iter().find(|r| r.is_active && r.urgent_bypass)
        {
            return Some(rule);
        }

        rules
            .iter()
            .filter(|r| r.is_active && r.matches_amount(amount))
            .min_by_key(|r| r.min_amount)
    }

    /// Share of approver records (manager/admin) that approved, in percent.
    ///
    /// Returns zero when no approver has acted yet.
    #[must_use]
    pub fn approval_percentage(records: &[ApprovalRecord]) -> Decimal {
        let approvers: Vec<_> = records
            .iter()
            .filter(|r| matches!(r.role, ActorRole::Manager | ActorRole::Admin))
            .collect();

        if approvers.is_empty() {
            return Decimal::ZERO;
        }

        let approved = approvers
            .iter()
            .filter(|r| r.status == RecordStatus::Approved)
            .count();

        Decimal::from(approved) / Decimal::from(approvers.len()) * Decimal::ONE_HUNDRED
    }
}

/// Creates the three-tier default rule catalog for a company.
///
/// - `[0, 5000]` — manager only
/// - `[5001, 25000]` — manager, then admin
/// - `[25001, ∞)` — manager, then admin
///
/// All tiers allow admin override and urgent bypass.
#[must_use]
pub fn default_rules(company_id: CompanyId) -> Vec<ApprovalRule> {
    vec![
        ApprovalRule {
            id: ApprovalRuleId::new(),
            company_id,
            name: "Low Amount - Manager Only".to_string(),
            min_amount: Decimal::ZERO,
            max_amount: Some(Decimal::from(5000)),
            sequence: vec![ApproverRole::Manager],
            percentage_required: 100,
            admin_override: true,
            urgent_bypass: true,
            is_active: true,
        },
        ApprovalRule {
            id: ApprovalRuleId::new(),
            company_id,
            name: "Medium Amount - Manager to Admin".to_string(),
            min_amount: Decimal::from(5001),
            max_amount: Some(Decimal::from(25000)),
            sequence: vec![ApproverRole::Manager, ApproverRole::Admin],
            percentage_required: 100,
            admin_override: true,
            urgent_bypass: true,
            is_active: true,
        },
        ApprovalRule {
            id: ApprovalRuleId::new(),
            company_id,
            name: "High Amount - Manager to Admin".to_string(),
            min_amount: Decimal::from(25001),
            max_amount: None,
            sequence: vec![ApproverRole::Manager, ApproverRole::Admin],
            percentage_required: 100,
            admin_override: true,
            urgent_bypass: true,
            is_active: true,
        },
    ]
}

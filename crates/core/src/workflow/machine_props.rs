//! Property-based tests for the workflow state machine.
//!
//! These validate the monotonic-progression and terminal-idempotence
//! invariants across arbitrary stage sequences.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal_macros::dec;

use outlay_shared::{ApprovalRuleId, CompanyId, CurrencyCode, ExpenseId, UserId};

use crate::workflow::error::WorkflowError;
use crate::workflow::machine::WorkflowMachine;
use crate::workflow::rules::ApprovalRule;
use crate::workflow::types::{
    Actor, ActorRole, ApproverRole, Decision, Expense, ExpenseStatus, Stage,
};

fn arb_sequence() -> impl Strategy<Value = Vec<ApproverRole>> {
    prop::collection::vec(
        prop_oneof![Just(ApproverRole::Manager), Just(ApproverRole::Admin)],
        1..=4,
    )
}

fn rule_with_sequence(company: CompanyId, sequence: Vec<ApproverRole>) -> ApprovalRule {
    ApprovalRule {
        id: ApprovalRuleId::new(),
        company_id: company,
        name: "generated".to_string(),
        min_amount: dec!(0),
        max_amount: None,
        sequence,
        percentage_required: 100,
        admin_override: true,
        urgent_bypass: false,
        is_active: true,
    }
}

fn fresh_expense(company: CompanyId, rule: &ApprovalRule) -> Expense {
    let (stage, cursor) = WorkflowMachine::initial_stage(Some(rule));
    Expense {
        id: ExpenseId::new(),
        company_id: company,
        user_id: UserId::new(),
        title: "generated".to_string(),
        description: None,
        amount: dec!(100),
        currency: CurrencyCode::new("USD"),
        base_amount: dec!(100),
        status: ExpenseStatus::Pending,
        current_stage: stage,
        stage_cursor: cursor,
        approval_rule: Some(rule.id),
        urgent: false,
        escalation_date: None,
        escalated: false,
        approved_by: None,
        approved_at: None,
        rejection_reason: None,
        submitted_at: Utc::now(),
        version: 0,
    }
}

fn actor_for(role: ApproverRole, company: CompanyId) -> Actor {
    let role = match role {
        ApproverRole::Manager => ActorRole::Manager,
        ApproverRole::Admin => ActorRole::Admin,
    };
    Actor {
        id: UserId::new(),
        role,
        company_id: company,
        user_set_id: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Approving with the correct role at every stage terminates in exactly
    /// `sequence.len()` steps, with a strictly advancing cursor and no
    /// status regression.
    #[test]
    fn prop_sequence_exhaustion_terminates(sequence in arb_sequence()) {
        let company = CompanyId::new();
        let rule = rule_with_sequence(company, sequence.clone());
        let mut expense = fresh_expense(company, &rule);

        for (i, role) in sequence.iter().enumerate() {
            prop_assert!(expense.status.is_actionable());
            prop_assert_eq!(expense.current_stage, Stage::Awaiting(*role));
            prop_assert_eq!(expense.stage_cursor, i);

            let step = WorkflowMachine::advance(
                &expense,
                Some(&rule),
                &actor_for(*role, company),
                Decision::Approve,
                None,
            ).unwrap();

            if i + 1 < sequence.len() {
                prop_assert_eq!(step.status, ExpenseStatus::InProgress);
                prop_assert_eq!(step.cursor, i + 1);
            } else {
                prop_assert_eq!(step.status, ExpenseStatus::Approved);
                prop_assert_eq!(step.stage, Stage::Completed);
            }

            expense.status = step.status;
            expense.current_stage = step.stage;
            expense.stage_cursor = step.cursor;
        }

        prop_assert!(expense.is_terminal());
    }

    /// Rejecting at any stage position terminates immediately without
    /// visiting the remaining stages.
    #[test]
    fn prop_reject_terminates_at_any_position(
        sequence in arb_sequence(),
        reject_at in 0usize..4,
    ) {
        let company = CompanyId::new();
        let rule = rule_with_sequence(company, sequence.clone());
        let mut expense = fresh_expense(company, &rule);
        let reject_at = reject_at % sequence.len();

        for (i, role) in sequence.iter().enumerate() {
            let decision = if i == reject_at { Decision::Reject } else { Decision::Approve };
            let step = WorkflowMachine::advance(
                &expense,
                Some(&rule),
                &actor_for(*role, company),
                decision,
                Some("declined"),
            ).unwrap();

            expense.status = step.status;
            expense.current_stage = step.stage;
            expense.stage_cursor = step.cursor;

            if i == reject_at {
                prop_assert_eq!(expense.status, ExpenseStatus::Rejected);
                prop_assert_eq!(expense.current_stage, Stage::Completed);
                break;
            }
        }

        prop_assert_eq!(expense.status, ExpenseStatus::Rejected);
    }

    /// Terminal states are idempotent: no further action mutates a decided
    /// expense, whatever the decision or actor role.
    #[test]
    fn prop_terminal_states_refuse_all_actions(
        sequence in arb_sequence(),
        approve in any::<bool>(),
        retry_role in prop_oneof![
            Just(ActorRole::Employee),
            Just(ActorRole::Manager),
            Just(ActorRole::Admin),
        ],
    ) {
        let company = CompanyId::new();
        let rule = rule_with_sequence(company, sequence.clone());
        let mut expense = fresh_expense(company, &rule);

        expense.status = if approve { ExpenseStatus::Approved } else { ExpenseStatus::Rejected };
        expense.current_stage = Stage::Completed;

        let actor = Actor {
            id: UserId::new(),
            role: retry_role,
            company_id: company,
            user_set_id: None,
        };

        let err = WorkflowMachine::advance(
            &expense,
            Some(&rule),
            &actor,
            Decision::Approve,
            None,
        ).unwrap_err();
        let refused = matches!(err, WorkflowError::NotActionable { .. });
        prop_assert!(refused, "advance on terminal expense returned {err:?}");

        // The override path refuses terminal expenses too.
        if retry_role == ActorRole::Admin {
            let err = WorkflowMachine::override_decision(&expense, &actor, Decision::Reject)
                .unwrap_err();
            let refused = matches!(err, WorkflowError::NotActionable { .. });
            prop_assert!(refused, "override on terminal expense returned {err:?}");
        }
    }
}

//! Escalation sweep tests over the in-memory store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;

use outlay_core::workflow::rules::default_rules;
use outlay_core::workflow::{
    Actor, ActorRole, ApproverRole, Decision, EscalationPolicy, ExpenseStatus, Stage,
    WorkflowError,
};
use outlay_engine::memory::{InMemoryStore, UserSeed};
use outlay_engine::rates::{CurrencyNormalizer, StaticRateSource};
use outlay_engine::service::{ExpenseDraft, ExpenseService};
use outlay_engine::store::WorkflowStore;
use outlay_shared::{CompanyId, CurrencyCode, UserId, UserSetId};

struct Fixture {
    store: Arc<InMemoryStore>,
    service: ExpenseService,
    employee: Actor,
    manager: Actor,
    admin: Actor,
}

fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let company = CompanyId::new();
    store.seed_company(company, CurrencyCode::new("USD"));
    store.seed_rules(company, default_rules(company));

    let set = UserSetId::new();
    let employee = Actor {
        id: UserId::new(),
        role: ActorRole::Employee,
        company_id: company,
        user_set_id: Some(set),
    };
    let manager = Actor {
        id: UserId::new(),
        role: ActorRole::Manager,
        company_id: company,
        user_set_id: Some(set),
    };
    let admin = Actor {
        id: UserId::new(),
        role: ActorRole::Admin,
        company_id: company,
        user_set_id: None,
    };
    store.seed_user(UserSeed {
        id: employee.id,
        username: "erin".to_string(),
        role: ActorRole::Employee,
        company_id: company,
        user_set_id: Some(set),
    });
    store.seed_user(UserSeed {
        id: manager.id,
        username: "marta".to_string(),
        role: ActorRole::Manager,
        company_id: company,
        user_set_id: Some(set),
    });
    store.seed_user(UserSeed {
        id: admin.id,
        username: "ada".to_string(),
        role: ActorRole::Admin,
        company_id: company,
        user_set_id: None,
    });
    store.seed_set_manager(set, manager.id);

    let service = ExpenseService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        CurrencyNormalizer::new(Arc::new(StaticRateSource::empty())),
        EscalationPolicy::new(48),
    );
    Fixture {
        store,
        service,
        employee,
        manager,
        admin,
    }
}

fn draft(amount: rust_decimal::Decimal) -> ExpenseDraft {
    ExpenseDraft {
        title: "Equipment".to_string(),
        description: None,
        amount,
        currency: CurrencyCode::new("USD"),
        urgent: false,
    }
}

#[tokio::test]
async fn test_escalation_date_set_on_submit() {
    let fx = fixture();
    let expense = fx.service.submit(draft(dec!(100)), &fx.employee).await.unwrap();
    assert_eq!(
        expense.escalation_date,
        Some(expense.submitted_at + Duration::hours(48))
    );
    assert!(!expense.escalated);
}

#[tokio::test]
async fn test_sweep_escalates_overdue_and_is_idempotent() {
    let fx = fixture();
    let expense = fx.service.submit(draft(dec!(6000)), &fx.employee).await.unwrap();

    // Nothing is due within the window.
    assert_eq!(fx.service.sweep_escalations().await.unwrap(), 0);

    let later = Utc::now() + Duration::hours(49);
    assert_eq!(fx.service.sweep_escalations_at(later).await.unwrap(), 1);

    let stored = fx.store.find_expense(expense.id).await.unwrap().unwrap();
    assert!(stored.escalated);
    assert_eq!(stored.status, ExpenseStatus::InProgress);
    assert_eq!(stored.current_stage, Stage::Awaiting(ApproverRole::Admin));
    assert_eq!(stored.version, 1);

    // A second sweep finds nothing: the flag keeps it out of the query.
    assert_eq!(fx.service.sweep_escalations_at(later).await.unwrap(), 0);
    let stored = fx.store.find_expense(expense.id).await.unwrap().unwrap();
    assert_eq!(stored.version, 1);
}

#[tokio::test]
async fn test_sweep_skips_terminal_expenses() {
    let fx = fixture();
    let open = fx.service.submit(draft(dec!(6000)), &fx.employee).await.unwrap();
    let decided = fx.service.submit(draft(dec!(100)), &fx.employee).await.unwrap();
    fx.service
        .advance(decided.id, &fx.manager, Decision::Approve, None)
        .await
        .unwrap();

    let later = Utc::now() + Duration::hours(49);
    assert_eq!(fx.service.sweep_escalations_at(later).await.unwrap(), 1);

    let decided = fx.store.find_expense(decided.id).await.unwrap().unwrap();
    assert!(!decided.escalated);
    let open = fx.store.find_expense(open.id).await.unwrap().unwrap();
    assert!(open.escalated);
}

#[tokio::test]
async fn test_escalated_expense_terminates_on_admin_approval() {
    let fx = fixture();
    // The low tier's sequence is manager-only; after escalation the admin
    // decision must still terminate the workflow.
    let expense = fx.service.submit(draft(dec!(100)), &fx.employee).await.unwrap();
    let later = Utc::now() + Duration::hours(49);
    fx.service.sweep_escalations_at(later).await.unwrap();

    // The original manager stage is gone.
    let err = fx
        .service
        .advance(expense.id, &fx.manager, Decision::Approve, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NotAuthorizedForStage { .. }));

    let result = fx
        .service
        .advance(expense.id, &fx.admin, Decision::Approve, None)
        .await
        .unwrap();
    assert_eq!(result.status, ExpenseStatus::Approved);
    assert_eq!(result.current_stage, Stage::Completed);
}

#[tokio::test]
async fn test_escalated_expense_can_still_be_rejected() {
    let fx = fixture();
    let expense = fx.service.submit(draft(dec!(6000)), &fx.employee).await.unwrap();
    let later = Utc::now() + Duration::hours(49);
    fx.service.sweep_escalations_at(later).await.unwrap();

    let result = fx
        .service
        .advance(expense.id, &fx.admin, Decision::Reject, Some("stale request"))
        .await
        .unwrap();
    assert_eq!(result.status, ExpenseStatus::Rejected);

    let stored = fx.store.find_expense(expense.id).await.unwrap().unwrap();
    assert_eq!(stored.rejection_reason.as_deref(), Some("stale request"));
}

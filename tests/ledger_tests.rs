// SPDX-License-Identifier: MIT

//! Ledger budget-enforcement tests.
//!
//! These tests verify that:
//! 1. The 1440-minute daily budget is enforced at add and update
//! 2. Rejected writes leave no trace in the store
//! 3. The update budget check excludes the target's current duration

use std::sync::Arc;

use chrono::NaiveDate;
use timetally::db::MemoryGateway;
use timetally::error::AppError;
use timetally::models::ActivityDraft;
use timetally::services::Ledger;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
}

/// Ledger bound to `user` with a live feed on `day()`.
async fn live_ledger(gateway: &Arc<MemoryGateway>, user: &str) -> Ledger {
    let mut ledger = Ledger::new(gateway.clone());
    ledger.bind_user(user);
    ledger
        .select_day(day())
        .await
        .expect("subscription should succeed");
    ledger
}

#[tokio::test]
async fn test_add_within_budget() {
    let gateway = Arc::new(MemoryGateway::new());
    let ledger = live_ledger(&gateway, "alice").await;

    ledger
        .add_activity(&ActivityDraft::new("Deep work", "work", 180))
        .await
        .unwrap();
    ledger
        .add_activity(&ActivityDraft::new("Lunch", "meals", 45))
        .await
        .unwrap();

    // The memory gateway broadcasts synchronously, so the accepted
    // writes are already visible.
    let activities = ledger.activities();
    assert_eq!(activities.len(), 2);
    assert_eq!(activities[0].name, "Deep work");
    assert_eq!(activities[1].name, "Lunch");
    assert_eq!(ledger.total_minutes(), 225);
    assert_eq!(ledger.remaining_minutes(), 1440 - 225);
}

#[tokio::test]
async fn test_add_over_budget_rejected() {
    let gateway = Arc::new(MemoryGateway::new());
    let ledger = live_ledger(&gateway, "alice").await;

    ledger
        .add_activity(&ActivityDraft::new("Night", "sleep", 1000))
        .await
        .unwrap();

    let err = ledger
        .add_activity(&ActivityDraft::new("Marathon", "exercise", 500))
        .await
        .unwrap_err();

    match err {
        AppError::BudgetExceeded {
            requested,
            remaining,
        } => {
            assert_eq!(requested, 500);
            assert_eq!(remaining, 440);
        }
        other => panic!("Expected BudgetExceeded, got {:?}", other),
    }

    // Zero side effects: the rejected activity never reached the store.
    assert_eq!(ledger.activities().len(), 1);
    assert_eq!(ledger.total_minutes(), 1000);
}

#[tokio::test]
async fn test_budget_boundary_is_inclusive() {
    let gateway = Arc::new(MemoryGateway::new());
    let ledger = live_ledger(&gateway, "alice").await;

    // Filling the day exactly is allowed.
    ledger
        .add_activity(&ActivityDraft::new("Everything", "other", 1440))
        .await
        .unwrap();
    assert_eq!(ledger.remaining_minutes(), 0);

    // One more minute is not.
    let err = ledger
        .add_activity(&ActivityDraft::new("Overflow", "other", 1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::BudgetExceeded { remaining: 0, .. }
    ));
}

#[tokio::test]
async fn test_update_excludes_own_duration() {
    let gateway = Arc::new(MemoryGateway::new());
    let ledger = live_ledger(&gateway, "alice").await;

    ledger
        .add_activity(&ActivityDraft::new("Morning", "work", 700))
        .await
        .unwrap();
    ledger
        .add_activity(&ActivityDraft::new("Evening", "study", 700))
        .await
        .unwrap();

    let target = ledger.activities()[1].id.clone();

    // 740 fits: the other activity leaves 1440 - 700 = 740 minutes.
    ledger
        .update_activity(&target, &ActivityDraft::new("Evening", "study", 740))
        .await
        .unwrap();
    assert_eq!(ledger.total_minutes(), 1440);

    // 741 does not, and the error reports the budget without the
    // target's own (now updated) duration.
    let err = ledger
        .update_activity(&target, &ActivityDraft::new("Evening", "study", 741))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::BudgetExceeded {
            requested: 741,
            remaining: 740,
        }
    ));

    // The failed update changed nothing.
    assert_eq!(ledger.total_minutes(), 1440);
}

#[tokio::test]
async fn test_update_unknown_id() {
    let gateway = Arc::new(MemoryGateway::new());
    let ledger = live_ledger(&gateway, "alice").await;

    let err = ledger
        .update_activity("missing", &ActivityDraft::new("Ghost", "other", 30))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_delete_removes_and_frees_budget() {
    let gateway = Arc::new(MemoryGateway::new());
    let ledger = live_ledger(&gateway, "alice").await;

    ledger
        .add_activity(&ActivityDraft::new("Night", "sleep", 480))
        .await
        .unwrap();
    let id = ledger.activities()[0].id.clone();

    ledger.delete_activity(&id).await.unwrap();

    assert!(ledger.activities().is_empty());
    assert_eq!(ledger.remaining_minutes(), 1440);
}

#[tokio::test]
async fn test_delete_unknown_id() {
    let gateway = Arc::new(MemoryGateway::new());
    let ledger = live_ledger(&gateway, "alice").await;

    ledger
        .add_activity(&ActivityDraft::new("Night", "sleep", 480))
        .await
        .unwrap();

    let err = ledger.delete_activity("missing").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(ledger.total_minutes(), 480);
}

#[tokio::test]
async fn test_invalid_drafts_rejected_before_store() {
    let gateway = Arc::new(MemoryGateway::new());
    let ledger = live_ledger(&gateway, "alice").await;

    for draft in [
        ActivityDraft::new("   ", "work", 30),
        ActivityDraft::new("Standup", "", 15),
        ActivityDraft::new("Nap", "sleep", 0),
    ] {
        let err = ledger.add_activity(&draft).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    assert!(ledger.activities().is_empty());
}

#[tokio::test]
async fn test_unbound_user_writes_rejected() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.inject("alice", day(), "Existing", "work", 60);

    let mut ledger = Ledger::new(gateway.clone());
    ledger.select_day(day()).await.unwrap();

    // No user: the selection holds but no feed attaches and no data
    // loads, even though the store has activities for this day.
    assert_eq!(ledger.selected_day(), Some(day()));
    assert!(ledger.activities().is_empty());
    assert_eq!(gateway.subscription_count(), 0);

    let err = ledger
        .add_activity(&ActivityDraft::new("Work", "work", 60))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));
}

#[tokio::test]
async fn test_external_writer_can_push_day_over_budget() {
    let gateway = Arc::new(MemoryGateway::new());
    let ledger = live_ledger(&gateway, "alice").await;

    ledger
        .add_activity(&ActivityDraft::new("Night", "sleep", 1440))
        .await
        .unwrap();

    // Another session writes without local validation.
    gateway.inject("alice", day(), "Elsewhere", "work", 120);

    // The overrun is reported as-is; clamping is a display concern.
    assert_eq!(ledger.total_minutes(), 1560);
    assert_eq!(ledger.remaining_minutes(), -120);

    // Further local adds fail with the negative remainder.
    let err = ledger
        .add_activity(&ActivityDraft::new("More", "work", 1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::BudgetExceeded {
            remaining: -120,
            ..
        }
    ));
}

#[tokio::test]
async fn test_store_failure_surfaces_and_leaves_state() {
    let gateway = Arc::new(MemoryGateway::new());
    let ledger = live_ledger(&gateway, "alice").await;

    ledger
        .add_activity(&ActivityDraft::new("Night", "sleep", 480))
        .await
        .unwrap();

    gateway.fail_writes_with("store unavailable");

    let err = ledger
        .add_activity(&ActivityDraft::new("Lunch", "meals", 45))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PersistenceFailed(_)));
    assert_eq!(ledger.total_minutes(), 480);

    gateway.restore_writes();
    ledger
        .add_activity(&ActivityDraft::new("Lunch", "meals", 45))
        .await
        .unwrap();
    assert_eq!(ledger.total_minutes(), 525);
}

#[tokio::test]
async fn test_users_are_isolated() {
    let gateway = Arc::new(MemoryGateway::new());
    let alice = live_ledger(&gateway, "alice").await;
    let bob = live_ledger(&gateway, "bob").await;

    alice
        .add_activity(&ActivityDraft::new("Night", "sleep", 1440))
        .await
        .unwrap();

    // Bob's budget is untouched by Alice's full day.
    assert!(bob.activities().is_empty());
    bob.add_activity(&ActivityDraft::new("Work", "work", 480))
        .await
        .unwrap();
    assert_eq!(bob.total_minutes(), 480);
    assert_eq!(alice.total_minutes(), 1440);
}

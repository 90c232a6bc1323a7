// SPDX-License-Identifier: MIT

//! Day selection and live-feed lifecycle tests.
//!
//! These tests verify that:
//! 1. Switching days discards the old day's state immediately
//! 2. Late snapshots from a previous selection never leak in
//! 3. Feed failures degrade to the last-known snapshot

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use timetally::db::MemoryGateway;
use timetally::models::ActivityDraft;
use timetally::services::Ledger;

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}

async fn live_ledger(gateway: &Arc<MemoryGateway>, user: &str, day: NaiveDate) -> Ledger {
    let mut ledger = Ledger::new(gateway.clone());
    ledger.bind_user(user);
    ledger
        .select_day(day)
        .await
        .expect("subscription should succeed");
    ledger
}

#[tokio::test]
async fn test_day_switch_discards_old_state_immediately() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.inject("alice", march(14), "Night", "sleep", 480);

    let mut ledger = live_ledger(&gateway, "alice", march(14)).await;
    assert_eq!(ledger.total_minutes(), 480);

    // March 15 has no data: the switch must not carry March 14 over.
    ledger.select_day(march(15)).await.unwrap();
    assert_eq!(ledger.selected_day(), Some(march(15)));
    assert!(ledger.activities().is_empty());
    assert_eq!(ledger.remaining_minutes(), 1440);

    // Exactly one live subscription remains after the switch.
    assert_eq!(gateway.subscription_count(), 1);
}

#[tokio::test]
async fn test_stale_snapshot_for_old_day_is_discarded() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.inject("alice", march(14), "Night", "sleep", 480);
    gateway.inject("alice", march(15), "Lunch", "meals", 45);

    let mut ledger = live_ledger(&gateway, "alice", march(14)).await;
    ledger.select_day(march(15)).await.unwrap();
    assert_eq!(ledger.total_minutes(), 45);

    // A late delivery tagged with the old day arrives after the
    // selection changed. It must be dropped, not applied.
    gateway.force_broadcast("alice", march(14));

    assert_eq!(ledger.selected_day(), Some(march(15)));
    assert_eq!(ledger.total_minutes(), 45);
    assert_eq!(ledger.activities()[0].name, "Lunch");
}

#[tokio::test]
async fn test_reselecting_same_day_does_not_duplicate() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.inject("alice", march(14), "Night", "sleep", 480);

    let mut ledger = live_ledger(&gateway, "alice", march(14)).await;
    ledger.select_day(march(14)).await.unwrap();
    ledger.select_day(march(14)).await.unwrap();

    // Snapshots are full replaces: repeated subscription cannot stack.
    assert_eq!(ledger.activities().len(), 1);
    assert_eq!(gateway.subscription_count(), 1);
}

#[tokio::test]
async fn test_feed_failure_keeps_last_snapshot() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.inject("alice", march(14), "Night", "sleep", 480);

    let ledger = live_ledger(&gateway, "alice", march(14)).await;
    assert!(ledger.last_sync_error().is_none());

    gateway.fail_subscriptions("alice", "stream reset");

    // Degraded, not empty: the last snapshot survives the failure.
    assert_eq!(ledger.last_sync_error().as_deref(), Some("stream reset"));
    assert_eq!(ledger.total_minutes(), 480);

    // The next successful delivery clears the error.
    gateway.inject("alice", march(14), "Lunch", "meals", 45);
    assert!(ledger.last_sync_error().is_none());
    assert_eq!(ledger.total_minutes(), 525);
}

#[tokio::test]
async fn test_change_listeners_fire_on_snapshots_and_errors() {
    let gateway = Arc::new(MemoryGateway::new());
    let ledger = live_ledger(&gateway, "alice", march(14)).await;

    let changes = Arc::new(AtomicUsize::new(0));
    let counter = changes.clone();
    ledger.on_change(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    gateway.inject("alice", march(14), "Night", "sleep", 480);
    assert_eq!(changes.load(Ordering::SeqCst), 1);

    gateway.fail_subscriptions("alice", "stream reset");
    assert_eq!(changes.load(Ordering::SeqCst), 2);

    // A snapshot for an unselected day is discarded without notifying.
    gateway.force_broadcast("alice", march(20));
    assert_eq!(changes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_external_writes_arrive_via_feed() {
    let gateway = Arc::new(MemoryGateway::new());
    let ledger = live_ledger(&gateway, "alice", march(14)).await;

    ledger
        .add_activity(&ActivityDraft::new("Morning", "work", 240))
        .await
        .unwrap();

    // Another session adds to the same day.
    gateway.inject("alice", march(14), "Elsewhere", "social", 60);

    let activities = ledger.activities();
    assert_eq!(activities.len(), 2);
    assert_eq!(activities[1].name, "Elsewhere");
    assert_eq!(ledger.total_minutes(), 300);
}

#[tokio::test]
async fn test_clear_user_tears_down_everything() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.inject("alice", march(14), "Night", "sleep", 480);

    let mut ledger = live_ledger(&gateway, "alice", march(14)).await;
    assert_eq!(gateway.subscription_count(), 1);

    ledger.clear_user();

    assert_eq!(gateway.subscription_count(), 0);
    assert_eq!(ledger.selected_day(), None);
    assert!(ledger.activities().is_empty());
}

#[tokio::test]
async fn test_one_shot_load_without_live_feed() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.inject("alice", march(14), "Night", "sleep", 480);

    let mut ledger = Ledger::new(gateway.clone());
    ledger.bind_user("alice");
    ledger.load_day(march(14)).await.unwrap();

    assert_eq!(ledger.total_minutes(), 480);
    assert_eq!(gateway.subscription_count(), 0);

    // No feed: later store changes do not appear until reloaded.
    gateway.inject("alice", march(14), "Lunch", "meals", 45);
    assert_eq!(ledger.total_minutes(), 480);

    ledger.load_day(march(14)).await.unwrap();
    assert_eq!(ledger.total_minutes(), 525);
}

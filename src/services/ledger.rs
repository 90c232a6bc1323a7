// SPDX-License-Identifier: MIT

//! Activity ledger: the per-day activity set and its budget rules.
//!
//! A `Ledger` is an explicit instance owned by one view or request (no
//! module-level globals): it binds a user, scopes itself to one day
//! selection, validates writes against the 1440-minute daily budget,
//! and mirrors the authoritative state pushed by the sync gateway's
//! live feed.
//!
//! Writes are two-phase: `add_activity`/`update_activity`/
//! `delete_activity` resolving means the write was *accepted* by the
//! gateway, not that the set changed. The in-memory set only changes
//! when a snapshot arrives (or on `load_day`), at which point change
//! listeners fire.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::db::{DaySnapshot, SnapshotObserver, SubscriptionHandle, SyncGateway};
use crate::error::{AppError, Result};
use crate::models::{total_minutes, Activity, ActivityDraft, MAX_MINUTES_PER_DAY};

#[derive(Default)]
struct DayState {
    day: Option<NaiveDate>,
    /// Ordered by `created_at` ascending, ties by insertion order.
    activities: Vec<Activity>,
}

/// State shared with the live feed, behind a mutex that is never held
/// across an await point.
struct LedgerShared {
    state: Mutex<DayState>,
    sync_error: Mutex<Option<String>>,
    listeners: Mutex<Vec<Box<dyn Fn() + Send + Sync>>>,
}

impl LedgerShared {
    fn new() -> Self {
        Self {
            state: Mutex::new(DayState::default()),
            sync_error: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Full-replace the activity set from a snapshot.
    ///
    /// A snapshot tagged with any day other than the current selection
    /// is discarded: it is a late delivery from a previous selection and
    /// must not overwrite the new day's state.
    fn apply_snapshot(&self, snapshot: DaySnapshot) {
        {
            let mut state = self.state.lock().unwrap();
            if state.day != Some(snapshot.day) {
                tracing::debug!(
                    snapshot_day = %snapshot.day,
                    "Discarding stale snapshot for unselected day"
                );
                return;
            }
            state.activities = snapshot.activities;
        }
        *self.sync_error.lock().unwrap() = None;
        self.notify();
    }

    /// Record a feed failure. The last-known snapshot is kept; the
    /// failure is surfaced through `last_sync_error` and a change
    /// notification.
    fn record_error(&self, message: String) {
        tracing::warn!(error = %message, "Live feed error, keeping last snapshot");
        *self.sync_error.lock().unwrap() = Some(message);
        self.notify();
    }

    fn notify(&self) {
        let listeners = self.listeners.lock().unwrap();
        for listener in listeners.iter() {
            listener();
        }
    }
}

/// Feed adapter handed to the gateway on subscribe.
struct LedgerFeed {
    shared: Arc<LedgerShared>,
}

impl SnapshotObserver for LedgerFeed {
    fn on_snapshot(&self, snapshot: DaySnapshot) {
        self.shared.apply_snapshot(snapshot);
    }

    fn on_error(&self, message: String) {
        self.shared.record_error(message);
    }
}

/// Per-day activity ledger with budget enforcement.
pub struct Ledger {
    gateway: Arc<dyn SyncGateway>,
    user_id: Option<String>,
    shared: Arc<LedgerShared>,
    subscription: Option<SubscriptionHandle>,
}

impl Ledger {
    pub fn new(gateway: Arc<dyn SyncGateway>) -> Self {
        Self {
            gateway,
            user_id: None,
            shared: Arc::new(LedgerShared::new()),
            subscription: None,
        }
    }

    /// Bind the authenticated user. No write or subscription proceeds
    /// without one.
    pub fn bind_user(&mut self, uid: impl Into<String>) {
        self.user_id = Some(uid.into());
    }

    /// Unbind the user and tear down all per-day state (sign-out path).
    pub fn clear_user(&mut self) {
        self.user_id = None;
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
        let mut state = self.shared.state.lock().unwrap();
        state.day = None;
        state.activities.clear();
    }

    /// Reset state to a new day selection, cancelling any live feed
    /// first so a late snapshot cannot land between reset and
    /// resubscribe.
    fn reset_to_day(&mut self, day: NaiveDate) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
        {
            let mut state = self.shared.state.lock().unwrap();
            state.day = Some(day);
            state.activities.clear();
        }
        *self.shared.sync_error.lock().unwrap() = None;
        self.shared.notify();
    }

    /// Select a day and attach a live feed for it.
    ///
    /// The previous day's activities are discarded immediately, before
    /// any data for the new day arrives. Re-selecting the same day
    /// resubscribes; snapshots are full replaces, so no duplication can
    /// result. Without a bound user this is a silent no-op: the day is
    /// selected but stays empty.
    pub async fn select_day(&mut self, day: NaiveDate) -> Result<()> {
        self.reset_to_day(day);

        let Some(user) = self.user_id.clone() else {
            return Ok(());
        };

        let observer = Arc::new(LedgerFeed {
            shared: Arc::clone(&self.shared),
        });
        let subscription = self.gateway.subscribe(&user, day, observer).await?;
        self.subscription = Some(subscription);
        Ok(())
    }

    /// One-shot variant of `select_day` for stateless callers: a single
    /// fetch instead of a live feed.
    pub async fn load_day(&mut self, day: NaiveDate) -> Result<()> {
        self.reset_to_day(day);

        let Some(user) = self.user_id.clone() else {
            return Ok(());
        };

        let activities = self.gateway.fetch_day(&user, day).await?;
        self.shared.apply_snapshot(DaySnapshot { day, activities });
        Ok(())
    }

    // ─── Read Accessors ──────────────────────────────────────────

    pub fn selected_day(&self) -> Option<NaiveDate> {
        self.shared.state.lock().unwrap().day
    }

    /// Current activity set, ordered by creation time.
    pub fn activities(&self) -> Vec<Activity> {
        self.shared.state.lock().unwrap().activities.clone()
    }

    /// Sum of durations for the selected day.
    pub fn total_minutes(&self) -> u64 {
        total_minutes(&self.shared.state.lock().unwrap().activities)
    }

    /// Minutes left in the daily budget. Signed: an external writer
    /// that bypassed validation can leave a day over budget, and that
    /// is reported as-is; clamping to zero is a display concern.
    pub fn remaining_minutes(&self) -> i64 {
        MAX_MINUTES_PER_DAY as i64 - self.total_minutes() as i64
    }

    /// Last live-feed error, if the feed is degraded. Cleared by the
    /// next successful snapshot.
    pub fn last_sync_error(&self) -> Option<String> {
        self.shared.sync_error.lock().unwrap().clone()
    }

    /// Register a change listener, invoked after every snapshot replace
    /// (live or one-shot) and on feed errors.
    pub fn on_change(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.shared.listeners.lock().unwrap().push(Box::new(listener));
    }

    // ─── Write Operations ────────────────────────────────────────

    fn bound_user(&self) -> Result<&str> {
        self.user_id.as_deref().ok_or(AppError::Unauthorized)
    }

    fn current_day(state: &DayState) -> Result<NaiveDate> {
        state
            .day
            .ok_or_else(|| AppError::InvalidInput("no day selected".to_string()))
    }

    /// Validate and persist a new activity.
    ///
    /// Success means the write was accepted; the activity itself
    /// appears via the live feed.
    pub async fn add_activity(&self, draft: &ActivityDraft) -> Result<()> {
        let user = self.bound_user()?.to_string();
        draft.validate()?;

        let day = {
            let state = self.shared.state.lock().unwrap();
            let day = Self::current_day(&state)?;
            let remaining = MAX_MINUTES_PER_DAY as i64 - total_minutes(&state.activities) as i64;
            if i64::from(draft.duration) > remaining {
                return Err(AppError::BudgetExceeded {
                    requested: u64::from(draft.duration),
                    remaining,
                });
            }
            day
        };

        self.gateway.create(&user, day, draft).await?;
        tracing::info!(user = %user, day = %day, duration = draft.duration, "Activity accepted");
        Ok(())
    }

    /// Validate and persist changes to an existing activity.
    ///
    /// The budget check excludes the target's current duration: the new
    /// duration must fit alongside the *other* activities of the day.
    pub async fn update_activity(&self, id: &str, draft: &ActivityDraft) -> Result<()> {
        let user = self.bound_user()?.to_string();
        draft.validate()?;

        let day = {
            let state = self.shared.state.lock().unwrap();
            let day = Self::current_day(&state)?;
            let current = state
                .activities
                .iter()
                .find(|a| a.id == id)
                .ok_or_else(|| AppError::NotFound(format!("activity {} not found", id)))?;
            let other_minutes =
                total_minutes(&state.activities) - u64::from(current.duration);
            let remaining = MAX_MINUTES_PER_DAY as i64 - other_minutes as i64;
            if i64::from(draft.duration) > remaining {
                return Err(AppError::BudgetExceeded {
                    requested: u64::from(draft.duration),
                    remaining,
                });
            }
            day
        };

        self.gateway.update(&user, day, id, draft).await?;
        tracing::info!(user = %user, day = %day, id, "Activity update accepted");
        Ok(())
    }

    /// Persist removal of an activity. No budget check.
    ///
    /// `NotFound` reflects the ledger's own snapshot; absence in the
    /// store itself is not an error.
    pub async fn delete_activity(&self, id: &str) -> Result<()> {
        let user = self.bound_user()?.to_string();

        let day = {
            let state = self.shared.state.lock().unwrap();
            let day = Self::current_day(&state)?;
            if !state.activities.iter().any(|a| a.id == id) {
                return Err(AppError::NotFound(format!("activity {} not found", id)));
            }
            day
        };

        self.gateway.delete(&user, day, id).await?;
        tracing::info!(user = %user, day = %day, id, "Activity delete accepted");
        Ok(())
    }
}

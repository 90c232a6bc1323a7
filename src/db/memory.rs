// SPDX-License-Identifier: MIT

//! In-memory sync gateway for tests and offline development.
//!
//! Snapshot broadcast is synchronous: a write call returns after every
//! subscriber for the touched `(user, day)` has received the new
//! snapshot. `created_at` values are synthetic and strictly monotonic,
//! so snapshot order is deterministic under test.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::db::{DaySnapshot, SnapshotObserver, SubscriptionHandle, SyncGateway};
use crate::error::{AppError, Result};
use crate::models::{Activity, ActivityDraft};

/// Synthetic timestamps start here and advance one second per write.
const CREATED_AT_EPOCH: i64 = 1_700_000_000;

struct Subscription {
    user: String,
    day: NaiveDate,
    observer: Arc<dyn SnapshotObserver>,
}

/// In-memory activity store with live snapshot broadcast.
#[derive(Default)]
pub struct MemoryGateway {
    store: Mutex<HashMap<(String, NaiveDate), Vec<Activity>>>,
    subscriptions: Arc<Mutex<HashMap<u64, Subscription>>>,
    next_activity: AtomicU64,
    next_subscription: AtomicU64,
    fail_writes: Mutex<Option<String>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next write sequence number and its synthetic timestamp.
    fn next_seq(&self) -> (u64, DateTime<Utc>) {
        let n = self.next_activity.fetch_add(1, Ordering::SeqCst);
        let created_at = Utc.timestamp_opt(CREATED_AT_EPOCH + n as i64, 0).unwrap();
        (n, created_at)
    }

    fn check_writes(&self) -> Result<()> {
        if let Some(message) = self.fail_writes.lock().unwrap().clone() {
            return Err(AppError::PersistenceFailed(message));
        }
        Ok(())
    }

    fn snapshot(&self, user: &str, day: NaiveDate) -> Vec<Activity> {
        self.store
            .lock()
            .unwrap()
            .get(&(user.to_string(), day))
            .cloned()
            .unwrap_or_default()
    }

    fn observers_for(&self, user: &str, day: NaiveDate) -> Vec<Arc<dyn SnapshotObserver>> {
        self.subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.user == user && s.day == day)
            .map(|s| s.observer.clone())
            .collect()
    }

    fn broadcast(&self, user: &str, day: NaiveDate) {
        let activities = self.snapshot(user, day);
        for observer in self.observers_for(user, day) {
            observer.on_snapshot(DaySnapshot {
                day,
                activities: activities.clone(),
            });
        }
    }

    // ─── Test Hooks ──────────────────────────────────────────────

    /// Make all subsequent writes fail with `PersistenceFailed`.
    pub fn fail_writes_with(&self, message: &str) {
        *self.fail_writes.lock().unwrap() = Some(message.to_string());
    }

    /// Restore normal write behavior.
    pub fn restore_writes(&self) {
        *self.fail_writes.lock().unwrap() = None;
    }

    /// Insert an activity directly, bypassing all validation. Emulates
    /// an external writer (another session) mutating the store.
    pub fn inject(&self, user: &str, day: NaiveDate, name: &str, category: &str, duration: u32) {
        let (seq, created_at) = self.next_seq();
        let activity = Activity {
            id: format!("ext-{}", seq),
            name: name.to_string(),
            category: category.to_string(),
            duration,
            created_at,
        };
        self.store
            .lock()
            .unwrap()
            .entry((user.to_string(), day))
            .or_default()
            .push(activity);
        self.broadcast(user, day);
    }

    /// Deliver the stored snapshot for `(user, day)` to every live
    /// subscription held by `user`, regardless of which day each
    /// subscription tracks. Emulates a late snapshot from a previously
    /// selected day arriving after the selection changed.
    pub fn force_broadcast(&self, user: &str, day: NaiveDate) {
        let activities = self.snapshot(user, day);
        let observers: Vec<_> = self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.user == user)
            .map(|s| s.observer.clone())
            .collect();
        for observer in observers {
            observer.on_snapshot(DaySnapshot {
                day,
                activities: activities.clone(),
            });
        }
    }

    /// Report a transport failure to every live subscription for `user`.
    pub fn fail_subscriptions(&self, user: &str, message: &str) {
        let observers: Vec<_> = self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.user == user)
            .map(|s| s.observer.clone())
            .collect();
        for observer in observers {
            observer.on_error(message.to_string());
        }
    }

    /// Number of live subscriptions (all users).
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().unwrap().len()
    }
}

#[async_trait]
impl SyncGateway for MemoryGateway {
    async fn subscribe(
        &self,
        user: &str,
        day: NaiveDate,
        observer: Arc<dyn SnapshotObserver>,
    ) -> Result<SubscriptionHandle> {
        let id = self.next_subscription.fetch_add(1, Ordering::SeqCst);
        self.subscriptions.lock().unwrap().insert(
            id,
            Subscription {
                user: user.to_string(),
                day,
                observer: observer.clone(),
            },
        );

        // Initial load counts as a change.
        observer.on_snapshot(DaySnapshot {
            day,
            activities: self.snapshot(user, day),
        });

        let subscriptions = Arc::clone(&self.subscriptions);
        Ok(SubscriptionHandle::new(move || {
            subscriptions.lock().unwrap().remove(&id);
        }))
    }

    async fn fetch_day(&self, user: &str, day: NaiveDate) -> Result<Vec<Activity>> {
        Ok(self.snapshot(user, day))
    }

    async fn create(&self, user: &str, day: NaiveDate, draft: &ActivityDraft) -> Result<()> {
        self.check_writes()?;
        let (seq, created_at) = self.next_seq();
        let activity = Activity {
            id: format!("mem-{}", seq),
            name: draft.name.trim().to_string(),
            category: draft.category.clone(),
            duration: draft.duration,
            created_at,
        };
        self.store
            .lock()
            .unwrap()
            .entry((user.to_string(), day))
            .or_default()
            .push(activity);
        self.broadcast(user, day);
        Ok(())
    }

    async fn update(
        &self,
        user: &str,
        day: NaiveDate,
        id: &str,
        draft: &ActivityDraft,
    ) -> Result<()> {
        self.check_writes()?;
        let changed = {
            let mut store = self.store.lock().unwrap();
            match store
                .get_mut(&(user.to_string(), day))
                .and_then(|activities| activities.iter_mut().find(|a| a.id == id))
            {
                Some(activity) => {
                    activity.name = draft.name.trim().to_string();
                    activity.category = draft.category.clone();
                    activity.duration = draft.duration;
                    true
                }
                // Store absence is not an error; there is just nothing
                // to announce.
                None => false,
            }
        };
        if changed {
            self.broadcast(user, day);
        }
        Ok(())
    }

    async fn delete(&self, user: &str, day: NaiveDate, id: &str) -> Result<()> {
        self.check_writes()?;
        let changed = {
            let mut store = self.store.lock().unwrap();
            match store.get_mut(&(user.to_string(), day)) {
                Some(activities) => {
                    let before = activities.len();
                    activities.retain(|a| a.id != id);
                    activities.len() != before
                }
                None => false,
            }
        };
        if changed {
            self.broadcast(user, day);
        }
        Ok(())
    }
}

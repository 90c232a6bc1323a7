// SPDX-License-Identifier: MIT

//! Persistence layer: the sync gateway contract and its backends.
//!
//! Activities are keyed by `(user, day)`. The gateway owns id and
//! `created_at` assignment on create, and pushes *full-snapshot* live
//! updates to subscribers: every delivery replaces the day's entire
//! activity set, so out-of-order delivery across snapshots reduces to
//! last-snapshot-wins.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreGateway;
pub use memory::MemoryGateway;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{Activity, ActivityDraft};

/// Collection names as constants.
pub mod collections {
    pub const ACTIVITIES: &str = "activities";
}

/// A full replacement of one day's activity set, as delivered by the
/// live feed. Carries its originating day so receivers can discard
/// snapshots that arrive after the selection changed.
#[derive(Debug, Clone)]
pub struct DaySnapshot {
    pub day: NaiveDate,
    /// Ordered by `created_at` ascending, ties by insertion order.
    pub activities: Vec<Activity>,
}

/// Receiver side of a live subscription.
///
/// The initial load counts as a change: gateways deliver the current
/// snapshot as soon as a subscription is established.
pub trait SnapshotObserver: Send + Sync {
    fn on_snapshot(&self, snapshot: DaySnapshot);
    fn on_error(&self, message: String);
}

/// Handle for an active live subscription. Cancelling (or dropping)
/// the handle stops the feed.
pub struct SubscriptionHandle {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl SubscriptionHandle {
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop the feed. Idempotent with drop.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// External persistence and live-update service for activities.
///
/// Writes are fire-and-forget from the caller's perspective: a resolved
/// call means the write was accepted, not that the activity set has
/// been updated. The authoritative state arrives via the live feed.
#[async_trait]
pub trait SyncGateway: Send + Sync {
    /// Establish a live feed for `(user, day)`. The observer receives
    /// the current snapshot immediately and a new one on every change.
    async fn subscribe(
        &self,
        user: &str,
        day: NaiveDate,
        observer: Arc<dyn SnapshotObserver>,
    ) -> Result<SubscriptionHandle>;

    /// One-shot ordered read of a day's activity set.
    async fn fetch_day(&self, user: &str, day: NaiveDate) -> Result<Vec<Activity>>;

    /// Persist a new activity. The gateway assigns id and `created_at`.
    async fn create(&self, user: &str, day: NaiveDate, draft: &ActivityDraft) -> Result<()>;

    /// Update name/category/duration of an existing activity.
    async fn update(
        &self,
        user: &str,
        day: NaiveDate,
        id: &str,
        draft: &ActivityDraft,
    ) -> Result<()>;

    /// Remove an activity. Absence of the record in the store is not an
    /// error.
    async fn delete(&self, user: &str, day: NaiveDate, id: &str) -> Result<()>;
}

// SPDX-License-Identifier: MIT

//! Firestore-backed sync gateway.
//!
//! Activities live in a single `activities` collection with `user_id`
//! and `day` fields, ordered by `created_at`. The gateway assigns ids
//! (timestamp plus process counter) and creation timestamps at write
//! time.
//!
//! The live feed is poll-based: a subscription task re-reads the day at
//! a configurable interval and delivers a snapshot whenever the result
//! changed. Local writes wake the poller immediately via a per
//! `(user, day)` notifier, so a writer's own session converges without
//! waiting out the interval; other sessions converge within one poll.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::db::{collections, DaySnapshot, SnapshotObserver, SubscriptionHandle, SyncGateway};
use crate::error::{AppError, Result};
use crate::models::{Activity, ActivityDraft};
use crate::time_utils::day_key;

/// Stored activity document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActivityRecord {
    /// Also used as the document ID
    id: String,
    user_id: String,
    /// Day key, `YYYY-MM-DD`
    day: String,
    name: String,
    category: String,
    duration: u32,
    /// RFC 3339; lexicographic order matches chronological order
    created_at: String,
}

impl ActivityRecord {
    fn into_activity(self) -> Activity {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Activity {
            id: self.id,
            name: self.name,
            category: self.category,
            duration: self.duration,
            created_at,
        }
    }
}

/// Firestore database client implementing the sync gateway.
pub struct FirestoreGateway {
    client: Option<firestore::FirestoreDb>,
    poll_interval: Duration,
    /// Wakeup channels keyed by `user/day`, shared with poll tasks.
    wakeups: Arc<DashMap<String, Arc<Notify>>>,
    id_counter: AtomicU64,
}

impl FirestoreGateway {
    /// Create a new Firestore gateway.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str, poll_interval: Duration) -> Result<Self> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id, poll_interval).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            AppError::PersistenceFailed(format!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
            poll_interval,
            wakeups: Arc::new(DashMap::new()),
            id_counter: AtomicU64::new(0),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str, poll_interval: Duration) -> Result<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::PersistenceFailed(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
            poll_interval,
            wakeups: Arc::new(DashMap::new()),
            id_counter: AtomicU64::new(0),
        })
    }

    /// Create a gateway in offline mode for testing.
    ///
    /// All operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            client: None,
            poll_interval: Duration::from_secs(1),
            wakeups: Arc::new(DashMap::new()),
            id_counter: AtomicU64::new(0),
        }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb> {
        self.client.as_ref().ok_or_else(|| {
            AppError::PersistenceFailed("Database not connected (offline mode)".to_string())
        })
    }

    fn wakeup(&self, user: &str, day: NaiveDate) -> Arc<Notify> {
        self.wakeups
            .entry(format!("{}/{}", user, day_key(day)))
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }

    /// Assign a new document id: creation micros plus a process-local
    /// counter so same-instant writes stay unique.
    fn next_id(&self) -> String {
        let seq = self.id_counter.fetch_add(1, Ordering::SeqCst);
        format!("{:x}-{:x}", Utc::now().timestamp_micros(), seq)
    }
}

/// Ordered read of one day's activities.
async fn query_day(
    client: &firestore::FirestoreDb,
    user: &str,
    day: NaiveDate,
) -> Result<Vec<Activity>> {
    let user_id = user.to_string();
    let day_str = day_key(day);

    let records: Vec<ActivityRecord> = client
        .fluent()
        .select()
        .from(collections::ACTIVITIES)
        .filter(move |q| {
            q.for_all([
                q.field("user_id").eq(user_id.clone()),
                q.field("day").eq(day_str.clone()),
            ])
        })
        .order_by([(
            "created_at",
            firestore::FirestoreQueryDirection::Ascending,
        )])
        .obj()
        .query()
        .await
        .map_err(|e| AppError::PersistenceFailed(e.to_string()))?;

    Ok(records
        .into_iter()
        .map(ActivityRecord::into_activity)
        .collect())
}

#[async_trait]
impl SyncGateway for FirestoreGateway {
    async fn subscribe(
        &self,
        user: &str,
        day: NaiveDate,
        observer: Arc<dyn SnapshotObserver>,
    ) -> Result<SubscriptionHandle> {
        let client = self.get_client()?.clone();
        let wakeup = self.wakeup(user, day);
        let poll_interval = self.poll_interval;
        let user = user.to_string();

        tracing::debug!(user = %user, day = %day, "Starting live feed");

        let task = tokio::spawn(async move {
            let mut last: Option<Vec<Activity>> = None;
            loop {
                match query_day(&client, &user, day).await {
                    Ok(activities) => {
                        if last.as_ref() != Some(&activities) {
                            last = Some(activities.clone());
                            observer.on_snapshot(DaySnapshot { day, activities });
                        }
                    }
                    Err(e) => observer.on_error(e.to_string()),
                }

                tokio::select! {
                    _ = wakeup.notified() => {}
                    _ = tokio::time::sleep(poll_interval) => {}
                }
            }
        });

        Ok(SubscriptionHandle::new(move || task.abort()))
    }

    async fn fetch_day(&self, user: &str, day: NaiveDate) -> Result<Vec<Activity>> {
        query_day(self.get_client()?, user, day).await
    }

    async fn create(&self, user: &str, day: NaiveDate, draft: &ActivityDraft) -> Result<()> {
        let record = ActivityRecord {
            id: self.next_id(),
            user_id: user.to_string(),
            day: day_key(day),
            name: draft.name.trim().to_string(),
            category: draft.category.clone(),
            duration: draft.duration,
            created_at: Utc::now().to_rfc3339(),
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ACTIVITIES)
            .document_id(&record.id)
            .object(&record)
            .execute()
            .await
            .map_err(|e| AppError::PersistenceFailed(e.to_string()))?;

        tracing::debug!(user, day = %day, id = %record.id, "Activity created");
        self.wakeup(user, day).notify_waiters();
        Ok(())
    }

    async fn update(
        &self,
        user: &str,
        day: NaiveDate,
        id: &str,
        draft: &ActivityDraft,
    ) -> Result<()> {
        // Fetch-modify-write to preserve the creation timestamp.
        let existing: Option<ActivityRecord> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ACTIVITIES)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::PersistenceFailed(e.to_string()))?;

        let Some(mut record) = existing else {
            // Absence in the store is not an error; the caller already
            // validated against its own snapshot.
            tracing::warn!(user, day = %day, id, "Update target missing from store");
            return Ok(());
        };

        record.name = draft.name.trim().to_string();
        record.category = draft.category.clone();
        record.duration = draft.duration;

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ACTIVITIES)
            .document_id(id)
            .object(&record)
            .execute()
            .await
            .map_err(|e| AppError::PersistenceFailed(e.to_string()))?;

        tracing::debug!(user, day = %day, id, "Activity updated");
        self.wakeup(user, day).notify_waiters();
        Ok(())
    }

    async fn delete(&self, user: &str, day: NaiveDate, id: &str) -> Result<()> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::ACTIVITIES)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::PersistenceFailed(e.to_string()))?;

        tracing::debug!(user, day = %day, id, "Activity deleted");
        self.wakeup(user, day).notify_waiters();
        Ok(())
    }
}

// SPDX-License-Identifier: MIT

//! Activity model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// The daily time budget: activities for one day may not exceed this.
pub const MAX_MINUTES_PER_DAY: u64 = 1440;

/// One logged activity, scoped to a calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Opaque identifier, assigned by the sync gateway on creation
    pub id: String,
    /// Display name
    pub name: String,
    /// Category registry key. Unrecognized keys are never rejected at
    /// write time; they resolve to the `other` entry at display time.
    pub category: String,
    /// Duration in minutes
    pub duration: u32,
    /// Creation timestamp, assigned by the sync gateway; the ordering
    /// key within a day (ties broken by insertion order)
    pub created_at: DateTime<Utc>,
}

/// Validated input for creating or updating an activity.
///
/// Doubles as the JSON request body for the write endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityDraft {
    pub name: String,
    pub category: String,
    pub duration: u32,
}

impl ActivityDraft {
    pub fn new(name: impl Into<String>, category: impl Into<String>, duration: u32) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            duration,
        }
    }

    /// Check the draft against the write-time input rules.
    ///
    /// Budget checks are the ledger's job; this only rejects input that
    /// should never reach the store.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "activity name must not be empty".to_string(),
            ));
        }
        if self.category.is_empty() {
            return Err(AppError::InvalidInput(
                "activity category must not be empty".to_string(),
            ));
        }
        if self.duration == 0 {
            return Err(AppError::InvalidInput(
                "activity duration must be a positive number of minutes".to_string(),
            ));
        }
        Ok(())
    }
}

/// Sum of durations over an activity set.
pub fn total_minutes(activities: &[Activity]) -> u64 {
    activities.iter().map(|a| u64::from(a.duration)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_reasonable_input() {
        assert!(ActivityDraft::new("Morning run", "exercise", 45)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let err = ActivityDraft::new("   ", "work", 30).validate().unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_validate_rejects_empty_category() {
        let err = ActivityDraft::new("Standup", "", 15).validate().unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_validate_rejects_zero_duration() {
        let err = ActivityDraft::new("Nap", "sleep", 0).validate().unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_total_minutes_sums_durations() {
        let activities = vec![
            Activity {
                id: "a".to_string(),
                name: "Work".to_string(),
                category: "work".to_string(),
                duration: 60,
                created_at: Utc::now(),
            },
            Activity {
                id: "b".to_string(),
                name: "Sleep".to_string(),
                category: "sleep".to_string(),
                duration: 480,
                created_at: Utc::now(),
            },
        ];
        assert_eq!(total_minutes(&activities), 540);
        assert_eq!(total_minutes(&[]), 0);
    }
}

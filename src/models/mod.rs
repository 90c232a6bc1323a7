// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod activity;
pub mod category;

pub use activity::{total_minutes, Activity, ActivityDraft, MAX_MINUTES_PER_DAY};
pub use category::{CategoryMeta, CATEGORIES};

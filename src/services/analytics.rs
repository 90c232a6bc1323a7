// SPDX-License-Identifier: MIT

//! Analytics aggregator: derived views over one day's activity set.
//!
//! Every function is a pure, full recomputation over the slice it is
//! given. Activity sets are bounded by the 1440-minute daily budget,
//! so there is nothing to gain from incremental or cached aggregation.
//!
//! Category handling: an *empty* category is attributed to `other`
//! (missing data), while an unrecognized non-empty key keeps its
//! literal key in totals and only resolves to the `other` display
//! metadata at render time.

use serde::Serialize;

use crate::models::{category, total_minutes, Activity, MAX_MINUTES_PER_DAY};

/// Segments narrower than this render without a label.
const LABEL_MIN_WIDTH_PERCENT: f64 = 5.0;
/// Timeline labels truncate the activity name to this many characters.
const LABEL_MAX_CHARS: usize = 8;
/// Bar-chart labels truncate the activity name to this many characters.
const BAR_LABEL_MAX_CHARS: usize = 15;

/// One slice of the day timeline, in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSegment {
    pub category: String,
    /// Share of the full day: `duration / 1440 * 100`
    pub width_percent: f64,
    /// Truncated activity name; empty for segments too narrow to label
    pub label: String,
}

/// One category's share of the day's logged time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub minutes: u64,
    /// Share of *logged* minutes (not of the full day)
    pub percentage: f64,
}

/// Summary-card bundle for a day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub total_minutes: u64,
    pub activity_count: usize,
    /// `round(total / count)`, 0 for an empty day
    pub average_duration: u64,
    pub top_category: Option<String>,
}

/// Chart-ready parallel series (labels, values, colors).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
    pub colors: Vec<String>,
}

fn effective_category(activity: &Activity) -> &str {
    if activity.category.is_empty() {
        "other"
    } else {
        &activity.category
    }
}

/// Summed duration per category key, in order of first chronological
/// appearance. That order is the deterministic tie-break source for
/// `top_category`.
pub fn category_totals(activities: &[Activity]) -> Vec<(String, u64)> {
    let mut totals: Vec<(String, u64)> = Vec::new();
    for activity in activities {
        let key = effective_category(activity);
        match totals.iter_mut().find(|entry| entry.0 == key) {
            Some(entry) => entry.1 += u64::from(activity.duration),
            None => totals.push((key.to_string(), u64::from(activity.duration))),
        }
    }
    totals
}

/// Category with the largest summed duration. Ties go to the category
/// that first appeared chronologically.
pub fn top_category(activities: &[Activity]) -> Option<String> {
    let mut top: Option<(String, u64)> = None;
    for (category, minutes) in category_totals(activities) {
        match &top {
            Some((_, best)) if minutes <= *best => {}
            _ => top = Some((category, minutes)),
        }
    }
    top.map(|(category, _)| category)
}

/// Mean duration, rounded to the nearest minute; 0 for an empty day.
pub fn average_duration(activities: &[Activity]) -> u64 {
    if activities.is_empty() {
        return 0;
    }
    (total_minutes(activities) as f64 / activities.len() as f64).round() as u64
}

/// Day timeline: one segment per activity, chronological order
/// preserved. Widths sum to `total / 1440 * 100`.
pub fn timeline_segments(activities: &[Activity]) -> Vec<TimelineSegment> {
    activities
        .iter()
        .map(|activity| {
            let width_percent =
                f64::from(activity.duration) / MAX_MINUTES_PER_DAY as f64 * 100.0;
            let label = if width_percent > LABEL_MIN_WIDTH_PERCENT {
                activity.name.chars().take(LABEL_MAX_CHARS).collect()
            } else {
                String::new()
            };
            TimelineSegment {
                category: effective_category(activity).to_string(),
                width_percent,
                label,
            }
        })
        .collect()
}

/// Unique categories in order of first appearance (timeline legend).
pub fn legend_categories(activities: &[Activity]) -> Vec<String> {
    let mut legend: Vec<String> = Vec::new();
    for activity in activities {
        let key = effective_category(activity);
        if !legend.iter().any(|c| c == key) {
            legend.push(key.to_string());
        }
    }
    legend
}

/// Per-category shares sorted by minutes descending; ties sort by
/// category key ascending.
pub fn category_breakdown(activities: &[Activity]) -> Vec<CategoryShare> {
    let total = total_minutes(activities);
    let mut shares: Vec<CategoryShare> = category_totals(activities)
        .into_iter()
        .map(|(category, minutes)| {
            let percentage = if total > 0 {
                minutes as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            CategoryShare {
                category,
                minutes,
                percentage,
            }
        })
        .collect();
    shares.sort_by(|a, b| {
        b.minutes
            .cmp(&a.minutes)
            .then_with(|| a.category.cmp(&b.category))
    });
    shares
}

/// Summary cards: total, count, average, top category.
pub fn summarize(activities: &[Activity]) -> DaySummary {
    DaySummary {
        total_minutes: total_minutes(activities),
        activity_count: activities.len(),
        average_duration: average_duration(activities),
        top_category: top_category(activities),
    }
}

/// Doughnut-chart series: one slice per category, colors resolved
/// through the registry (unknown keys get the `other` entry).
pub fn category_pie_series(activities: &[Activity]) -> ChartSeries {
    let totals = category_totals(activities);
    let mut series = ChartSeries {
        labels: Vec::with_capacity(totals.len()),
        values: Vec::with_capacity(totals.len()),
        colors: Vec::with_capacity(totals.len()),
    };
    for (key, minutes) in totals {
        let meta = category::lookup(&key);
        series.labels.push(meta.label.to_string());
        series.values.push(minutes);
        series.colors.push(meta.color.to_string());
    }
    series
}

/// Bar-chart series: one bar per activity, names truncated for axis
/// labels, colored by category.
pub fn duration_bar_series(activities: &[Activity]) -> ChartSeries {
    let mut series = ChartSeries {
        labels: Vec::with_capacity(activities.len()),
        values: Vec::with_capacity(activities.len()),
        colors: Vec::with_capacity(activities.len()),
    };
    for activity in activities {
        let label = if activity.name.chars().count() > BAR_LABEL_MAX_CHARS {
            let truncated: String = activity.name.chars().take(BAR_LABEL_MAX_CHARS).collect();
            format!("{}...", truncated)
        } else {
            activity.name.clone()
        };
        series.labels.push(label);
        series.values.push(u64::from(activity.duration));
        series
            .colors
            .push(category::lookup(effective_category(activity)).color.to_string());
    }
    series
}

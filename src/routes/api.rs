// SPDX-License-Identifier: MIT

//! API routes for the activity ledger and day analytics.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{category, ActivityDraft, CATEGORIES};
use crate::services::analytics;
use crate::services::{ChartSeries, Ledger, TimelineSegment};
use crate::time_utils::{day_key, format_minutes};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/days/{date}", get(get_day))
        .route("/api/days/{date}/activities", post(add_activity))
        .route(
            "/api/days/{date}/activities/{id}",
            put(update_activity).delete(delete_activity),
        )
        .route("/api/days/{date}/summary", get(get_day_summary))
}

/// Public API routes (no authentication).
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/categories", get(get_categories))
}

/// Bind the request's user and load one day's state into a fresh
/// ledger. HTTP callers get a one-shot read; the live feed is for
/// long-lived consumers.
async fn day_ledger(state: &AppState, user: &AuthUser, date: NaiveDate) -> Result<Ledger> {
    let mut ledger = Ledger::new(state.gateway.clone());
    ledger.bind_user(user.uid.clone());
    ledger.load_day(date).await?;
    Ok(ledger)
}

// ─── Category Registry ───────────────────────────────────────

/// One category registry entry.
#[derive(Serialize)]
pub struct CategoryResponse {
    pub key: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub label: &'static str,
}

impl From<&'static category::CategoryMeta> for CategoryResponse {
    fn from(meta: &'static category::CategoryMeta) -> Self {
        Self {
            key: meta.key,
            icon: meta.icon,
            color: meta.color,
            label: meta.label,
        }
    }
}

/// List the category registry.
async fn get_categories() -> Json<Vec<CategoryResponse>> {
    Json(CATEGORIES.iter().map(CategoryResponse::from).collect())
}

// ─── Day State ───────────────────────────────────────────────

/// One activity in a day response.
#[derive(Serialize)]
pub struct ActivityResponse {
    pub id: String,
    pub name: String,
    pub category: String,
    pub duration: u32,
    pub created_at: String,
}

/// Full state of one day.
#[derive(Serialize)]
pub struct DayResponse {
    pub date: String,
    pub activities: Vec<ActivityResponse>,
    pub total_minutes: u64,
    pub remaining_minutes: i64,
}

/// Get one day's activities with budget totals.
async fn get_day(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<DayResponse>> {
    let ledger = day_ledger(&state, &user, date).await?;

    let activities = ledger
        .activities()
        .into_iter()
        .map(|a| ActivityResponse {
            id: a.id,
            name: a.name,
            category: a.category,
            duration: a.duration,
            created_at: a.created_at.to_rfc3339(),
        })
        .collect();

    Ok(Json(DayResponse {
        date: day_key(date),
        activities,
        total_minutes: ledger.total_minutes(),
        remaining_minutes: ledger.remaining_minutes(),
    }))
}

// ─── Writes ──────────────────────────────────────────────────

/// Request body for create and update.
#[derive(Deserialize)]
pub struct ActivityRequest {
    pub name: String,
    pub category: String,
    pub duration: u32,
}

impl ActivityRequest {
    fn into_draft(self) -> ActivityDraft {
        ActivityDraft::new(self.name, self.category, self.duration)
    }
}

/// Response for accepted writes.
///
/// Writes are two-phase: 202 means the store accepted the write, not
/// that it is visible yet. Clients observe the result through their
/// live feed or the next day read.
#[derive(Serialize)]
pub struct AcceptedResponse {
    pub accepted: bool,
}

fn accepted() -> (StatusCode, Json<AcceptedResponse>) {
    (StatusCode::ACCEPTED, Json(AcceptedResponse { accepted: true }))
}

/// Log a new activity against a day's budget.
async fn add_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(date): Path<NaiveDate>,
    Json(body): Json<ActivityRequest>,
) -> Result<(StatusCode, Json<AcceptedResponse>)> {
    let ledger = day_ledger(&state, &user, date).await?;
    ledger.add_activity(&body.into_draft()).await?;
    Ok(accepted())
}

/// Rewrite an existing activity, revalidating the budget.
async fn update_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((date, id)): Path<(NaiveDate, String)>,
    Json(body): Json<ActivityRequest>,
) -> Result<(StatusCode, Json<AcceptedResponse>)> {
    let ledger = day_ledger(&state, &user, date).await?;
    ledger.update_activity(&id, &body.into_draft()).await?;
    Ok(accepted())
}

/// Remove an activity.
async fn delete_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((date, id)): Path<(NaiveDate, String)>,
) -> Result<(StatusCode, Json<AcceptedResponse>)> {
    let ledger = day_ledger(&state, &user, date).await?;
    ledger.delete_activity(&id).await?;
    Ok(accepted())
}

// ─── Day Summary ─────────────────────────────────────────────

/// One row of the category breakdown, registry metadata resolved.
#[derive(Serialize)]
pub struct BreakdownEntry {
    pub category: String,
    pub icon: &'static str,
    pub label: &'static str,
    pub minutes: u64,
    pub minutes_formatted: String,
    pub percentage: f64,
}

/// Aggregated view of one day.
#[derive(Serialize)]
pub struct SummaryResponse {
    pub date: String,
    pub total_minutes: u64,
    pub total_formatted: String,
    pub remaining_minutes: i64,
    pub activity_count: usize,
    pub average_duration: u64,
    pub average_formatted: String,
    pub top_category: Option<CategoryResponse>,
    pub timeline: Vec<TimelineSegment>,
    pub legend: Vec<CategoryResponse>,
    pub breakdown: Vec<BreakdownEntry>,
    pub pie_chart: ChartSeries,
    pub bar_chart: ChartSeries,
}

/// Get the aggregated analytics for one day.
async fn get_day_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<SummaryResponse>> {
    let ledger = day_ledger(&state, &user, date).await?;
    let activities = ledger.activities();

    let summary = analytics::summarize(&activities);
    let breakdown = analytics::category_breakdown(&activities)
        .into_iter()
        .map(|share| {
            let meta = category::lookup(&share.category);
            BreakdownEntry {
                category: share.category,
                icon: meta.icon,
                label: meta.label,
                minutes: share.minutes,
                minutes_formatted: format_minutes(share.minutes),
                percentage: share.percentage,
            }
        })
        .collect();
    let legend = analytics::legend_categories(&activities)
        .iter()
        .map(|key| CategoryResponse::from(category::lookup(key)))
        .collect();

    Ok(Json(SummaryResponse {
        date: day_key(date),
        total_minutes: summary.total_minutes,
        total_formatted: format_minutes(summary.total_minutes),
        remaining_minutes: ledger.remaining_minutes(),
        activity_count: summary.activity_count,
        average_duration: summary.average_duration,
        average_formatted: format_minutes(summary.average_duration),
        top_category: summary
            .top_category
            .as_deref()
            .map(|key| CategoryResponse::from(category::lookup(key))),
        timeline: analytics::timeline_segments(&activities),
        legend,
        breakdown,
        pie_chart: analytics::category_pie_series(&activities),
        bar_chart: analytics::duration_bar_series(&activities),
    }))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity routes: logging, history, summaries, and the calculator.

use crate::emissions::EmissionFactorTable;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Activity, ActivityType, CarbonSummary, GoalProgress};
use crate::services::activity::score;
use crate::services::{ActivityLogger, MealEstimate};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const DEFAULT_SUMMARY_DAYS: u32 = 30;
const MAX_SUMMARY_DAYS: u32 = 366;

/// Calculator routes (no auth required).
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/emission-factors", get(get_emission_factors))
        .route("/api/activities/preview", post(preview_activity))
}

/// Activity routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/activities", post(log_activity))
        .route("/api/activities/me", get(get_my_activities))
        .route("/api/activities/me/summary", get(get_my_summary))
        .route("/api/activities/meal-estimate", post(estimate_meal))
}

/// Raw activity body. Fields stay untyped here so each validation
/// failure can be reported with its own message.
#[derive(Debug, Deserialize)]
pub struct ActivityRequest {
    #[serde(rename = "type")]
    pub activity_type: Option<serde_json::Value>,
    pub data: Option<serde_json::Value>,
}

// ─── Calculator ──────────────────────────────────────────────

async fn get_emission_factors() -> Json<EmissionFactorTable> {
    Json(EmissionFactorTable::current())
}

/// Calculator result for a payload that was not stored.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PreviewResponse {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub category: String,
    pub carbon_kg: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub points: u64,
}

/// Run the calculator without storing anything.
async fn preview_activity(Json(req): Json<ActivityRequest>) -> Result<Json<PreviewResponse>> {
    let (details, emission) = score(req.activity_type.as_ref(), req.data)?;
    let activity_type = details.activity_type();

    Ok(Json(PreviewResponse {
        activity_type,
        category: activity_type.category().to_string(),
        carbon_kg: emission.carbon_kg,
        points: emission.points,
    }))
}

// ─── Logging and History ─────────────────────────────────────

/// Log an activity; carbon and points are computed here.
async fn log_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ActivityRequest>,
) -> Result<(StatusCode, Json<Activity>)> {
    let logger = ActivityLogger::new(state.db.clone());
    let activity = logger
        .log_activity(&user.user_id, req.activity_type.as_ref(), req.data)
        .await?;

    Ok((StatusCode::CREATED, Json(activity)))
}

/// All of the caller's activities, newest first.
async fn get_my_activities(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Activity>>> {
    let activities = state.db.get_activities_for_user(&user.user_id).await?;
    Ok(Json(activities))
}

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    pub days: Option<u32>,
}

/// Carbon totals for a trailing window plus progress against the goal.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SummaryResponse {
    pub days: u32,
    pub summary: CarbonSummary,
    pub goal: GoalProgress,
}

async fn get_my_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<SummaryResponse>> {
    let days = params.days.unwrap_or(DEFAULT_SUMMARY_DAYS);
    if !(1..=MAX_SUMMARY_DAYS).contains(&days) {
        return Err(AppError::BadRequest(format!(
            "days must be between 1 and {}",
            MAX_SUMMARY_DAYS
        )));
    }

    let profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let since = Utc::now() - Duration::days(i64::from(days));
    let activities = state.db.get_activities_for_user(&user.user_id).await?;
    let summary = CarbonSummary::from_activities(
        activities.iter().filter(|a| a.timestamp >= since),
    );
    let goal = GoalProgress::new(summary.total_carbon_kg, profile.target_kg);

    Ok(Json(SummaryResponse {
        days,
        summary,
        goal,
    }))
}

// ─── Meal Estimation ─────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct MealEstimateRequest {
    #[serde(rename = "mealText")]
    #[validate(length(min = 1, max = 2000, message = "mealText must be 1-2000 characters"))]
    pub meal_text: String,
}

/// Advisory carbon estimate for a described meal. Never stored.
async fn estimate_meal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(mut req): Json<MealEstimateRequest>,
) -> Result<Json<MealEstimate>> {
    req.meal_text = req.meal_text.trim().to_string();
    req.validate()?;

    tracing::debug!(user_id = %user.user_id, "Estimating meal");
    Ok(Json(state.meal_analyzer.analyze(&req.meal_text).await))
}

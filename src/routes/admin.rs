// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Development-only database inspection and reset.
//!
//! Mounted only when `ENABLE_ADMIN_ROUTES` is set. There is no access
//! control on these routes.

use crate::error::Result;
use crate::models::{Activity, User, UserProfile};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    routing::{delete, get},
    Json, Router,
};
use futures_util::future::try_join;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/database", get(get_database))
        .route("/api/admin/users", get(get_users))
        .route("/api/admin/activities", get(get_activities))
        .route("/api/admin/reset", delete(reset_database))
}

/// Activity annotated with its owner's email.
#[derive(Debug, Serialize)]
pub struct AdminActivity {
    #[serde(flatten)]
    pub activity: Activity,
    pub user_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DatabaseStats {
    pub total_users: usize,
    pub total_activities: usize,
    pub total_points: u64,
    pub total_carbon_kg: f64,
}

#[derive(Debug, Serialize)]
pub struct DatabaseOverview {
    pub backend: &'static str,
    pub stats: DatabaseStats,
    pub users: Vec<UserProfile>,
    pub activities: Vec<AdminActivity>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub message: String,
    pub deleted_users: usize,
    pub deleted_activities: usize,
    pub timestamp: String,
}

fn with_owner_emails(users: &[User], activities: Vec<Activity>) -> Vec<AdminActivity> {
    let emails: HashMap<&str, &str> = users
        .iter()
        .map(|u| (u.id.as_str(), u.email.as_str()))
        .collect();

    activities
        .into_iter()
        .map(|activity| AdminActivity {
            user_email: emails.get(activity.user_id.as_str()).map(|e| e.to_string()),
            activity,
        })
        .collect()
}

/// Everything in the store plus aggregate totals.
async fn get_database(State(state): State<Arc<AppState>>) -> Result<Json<DatabaseOverview>> {
    let (users, activities) =
        try_join(state.db.list_users(), state.db.list_activities()).await?;

    let total_carbon_kg = activities.iter().map(|a| a.carbon_kg).sum::<f64>();
    let stats = DatabaseStats {
        total_users: users.len(),
        total_activities: activities.len(),
        total_points: users.iter().map(|u| u.points).sum(),
        total_carbon_kg: (total_carbon_kg * 100.0).round() / 100.0,
    };

    Ok(Json(DatabaseOverview {
        backend: state.db.backend_name(),
        stats,
        users: users.iter().map(User::profile).collect(),
        activities: with_owner_emails(&users, activities),
        timestamp: format_utc_rfc3339(chrono::Utc::now()),
    }))
}

async fn get_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<UserProfile>>> {
    let users = state.db.list_users().await?;
    Ok(Json(users.iter().map(User::profile).collect()))
}

async fn get_activities(State(state): State<Arc<AppState>>) -> Result<Json<Vec<AdminActivity>>> {
    let (users, activities) =
        try_join(state.db.list_users(), state.db.list_activities()).await?;
    Ok(Json(with_owner_emails(&users, activities)))
}

/// Delete all users, email index entries and activities.
async fn reset_database(State(state): State<Arc<AppState>>) -> Result<Json<ResetResponse>> {
    let summary = state.db.reset().await?;

    tracing::warn!(
        users = summary.users,
        activities = summary.activities,
        "Database reset via admin route"
    );

    Ok(Json(ResetResponse {
        message: "Database reset successfully".to_string(),
        deleted_users: summary.users,
        deleted_activities: summary.activities,
        timestamp: format_utc_rfc3339(chrono::Utc::now()),
    }))
}

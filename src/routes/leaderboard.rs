// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public leaderboard.

use crate::error::Result;
use crate::models::leaderboard::{rank_users, LEADERBOARD_SIZE};
use crate::models::LeaderboardEntry;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/leaderboard", get(get_leaderboard))
}

/// Top users by eco-points.
async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LeaderboardEntry>>> {
    let users = state.db.get_top_users(LEADERBOARD_SIZE).await?;
    Ok(Json(rank_users(users, LEADERBOARD_SIZE)))
}

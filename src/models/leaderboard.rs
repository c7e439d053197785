// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Leaderboard ranking.

use crate::models::User;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Maximum number of leaderboard entries.
pub const LEADERBOARD_SIZE: usize = 10;

/// One ranked leaderboard row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardEntry {
    /// Local part of the user's email
    pub name: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub points: u64,
    /// 1-based position
    pub rank: u32,
    pub user_id: String,
}

/// Rank users by points.
///
/// Users without points are dropped, the rest are ordered by points
/// descending and cut to `limit`. The sort is stable, so ties keep the
/// order the store returned them in.
pub fn rank_users(users: Vec<User>, limit: usize) -> Vec<LeaderboardEntry> {
    let mut users: Vec<User> = users.into_iter().filter(|u| u.points > 0).collect();
    users.sort_by(|a, b| b.points.cmp(&a.points));
    users.truncate(limit);

    users
        .iter()
        .enumerate()
        .map(|(index, user)| LeaderboardEntry {
            name: user.display_name().to_string(),
            points: user.points,
            rank: index as u32 + 1,
            user_id: user.id.clone(),
        })
        .collect()
}

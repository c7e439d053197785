// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod leaderboard;
pub mod stats;
pub mod user;

pub use activity::{Activity, ActivityDetails, ActivityType};
pub use leaderboard::LeaderboardEntry;
pub use stats::{CarbonSummary, GoalProgress};
pub use user::{User, UserEmail, UserProfile};

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! EcoTrack: carbon-footprint tracking with eco-points
//!
//! This crate provides the backend API: users log transport, energy and
//! food activities, the server computes their emissions and eco-points,
//! and a leaderboard ranks users by points.

pub mod config;
pub mod db;
pub mod emissions;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use services::MealAnalyzer;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub meal_analyzer: MealAnalyzer,
}

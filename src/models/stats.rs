// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Carbon summaries and goal progress for the dashboard.
//!
//! Computed on read from the user's activity list; nothing here is stored.

use serde::Serialize;
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::Activity;

/// Totals over a set of activities.
#[derive(Debug, Clone, Default, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CarbonSummary {
    /// Number of activities counted
    pub activity_count: u32,
    /// Total kg CO₂e
    pub total_carbon_kg: f64,
    /// Total eco-points
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_points: u64,
    /// kg CO₂e per category label ("Transport", ...)
    pub carbon_by_category: HashMap<String, f64>,
    /// kg CO₂e per month ("YYYY-MM")
    pub carbon_by_month: HashMap<String, f64>,
}

impl CarbonSummary {
    pub fn from_activities<'a>(activities: impl IntoIterator<Item = &'a Activity>) -> Self {
        let mut summary = Self::default();
        for activity in activities {
            summary.add_activity(activity);
        }
        summary.round_totals();
        summary
    }

    /// Fold one activity into the totals.
    pub fn add_activity(&mut self, activity: &Activity) {
        self.activity_count += 1;
        self.total_carbon_kg += activity.carbon_kg;
        self.total_points = self.total_points.saturating_add(activity.points);

        *self
            .carbon_by_category
            .entry(activity.category.clone())
            .or_insert(0.0) += activity.carbon_kg;

        if let Some(month_key) = extract_month_key(&activity.date) {
            *self.carbon_by_month.entry(month_key).or_insert(0.0) += activity.carbon_kg;
        }
    }

    // Summing 2-decimal values accumulates float noise (0.1 + 0.2 ...).
    fn round_totals(&mut self) {
        self.total_carbon_kg = round_to_cents(self.total_carbon_kg);
        for value in self.carbon_by_category.values_mut() {
            *value = round_to_cents(*value);
        }
        for value in self.carbon_by_month.values_mut() {
            *value = round_to_cents(*value);
        }
    }
}

/// Progress of a window's emissions against the monthly budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GoalProgress {
    pub carbon_kg: f64,
    pub target_kg: f64,
    /// `min(carbon_kg / target_kg, 1) * 100`
    pub progress_percent: f64,
}

impl GoalProgress {
    pub fn new(carbon_kg: f64, target_kg: f64) -> Self {
        let progress_percent = if target_kg > 0.0 {
            round_to_cents((carbon_kg / target_kg * 100.0).clamp(0.0, 100.0))
        } else {
            0.0
        };

        Self {
            carbon_kg,
            target_kg,
            progress_percent,
        }
    }
}

/// Extract "YYYY-MM" from a "YYYY-MM-DD" date.
fn extract_month_key(date: &str) -> Option<String> {
    date.get(..7).map(str::to_string)
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

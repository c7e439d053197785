// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Emission factor table and the carbon/points calculator.
//!
//! This is the only place emission factors are defined. The server uses it
//! for the authoritative value stored with each activity, and the same
//! table is served to the frontend (`GET /api/emission-factors`) so the
//! live preview can never drift from what gets persisted.

use crate::models::ActivityDetails;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// kg CO₂e per kWh of electricity.
pub const ENERGY_KG_PER_KWH: f64 = 0.4;

/// Eco-points awarded per kg CO₂e.
pub const POINTS_PER_KG: f64 = 10.0;

/// Largest emission a single activity may record (kg CO₂e).
///
/// Keeps points well inside the exact-integer range of `f64` and the
/// signed 64-bit integers Firestore stores.
pub const MAX_CARBON_KG: f64 = 1_000_000_000.0;

/// Vehicle categories for transport activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum VehicleType {
    Sedan,
    #[serde(rename = "SUV")]
    Suv,
    Motorbike,
}

impl VehicleType {
    pub const ALL: [VehicleType; 3] = [VehicleType::Sedan, VehicleType::Suv, VehicleType::Motorbike];

    /// kg CO₂e per km travelled.
    pub fn factor(self) -> f64 {
        match self {
            VehicleType::Sedan => 0.2,
            VehicleType::Suv => 0.3,
            VehicleType::Motorbike => 0.1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VehicleType::Sedan => "Sedan",
            VehicleType::Suv => "SUV",
            VehicleType::Motorbike => "Motorbike",
        }
    }
}

/// Meal categories for food activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum MealType {
    #[serde(rename = "High Meat")]
    HighMeat,
    #[serde(rename = "Low Meat")]
    LowMeat,
    Vegetarian,
    Vegan,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::HighMeat,
        MealType::LowMeat,
        MealType::Vegetarian,
        MealType::Vegan,
    ];

    /// kg CO₂e per meal, independent of portion size.
    pub fn factor(self) -> f64 {
        match self {
            MealType::HighMeat => 5.0,
            MealType::LowMeat => 3.0,
            MealType::Vegetarian => 1.5,
            MealType::Vegan => 0.5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MealType::HighMeat => "High Meat",
            MealType::LowMeat => "Low Meat",
            MealType::Vegetarian => "Vegetarian",
            MealType::Vegan => "Vegan",
        }
    }
}

/// Computed emission for a single activity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Emission {
    /// kg CO₂e, rounded to 2 decimal places
    pub carbon_kg: f64,
    pub points: u64,
}

/// Reasons an activity cannot be scored.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmissionError {
    #[error("Activity quantity must be a finite number")]
    NonFinite,

    #[error("Computed emission must be greater than zero")]
    NonPositive,

    #[error("Computed emission exceeds the per-activity maximum")]
    TooLarge,
}

/// Compute `(carbon_kg, points)` for an activity.
///
/// Pure: the same input always yields the same result, and nothing outside
/// the argument is read.
///
/// Points are derived from the rounded `carbon_kg`, not the raw product, so
/// e.g. 0.0496 kg stores as 0.05 kg and 1 point.
pub fn calculate(details: &ActivityDetails) -> Result<Emission, EmissionError> {
    let raw = match details {
        ActivityDetails::Transport(t) => t.vehicle_type.factor() * t.distance,
        ActivityDetails::Energy(e) => ENERGY_KG_PER_KWH * e.electricity,
        ActivityDetails::Food(f) => f.meal_type.factor(),
    };

    if !raw.is_finite() {
        return Err(EmissionError::NonFinite);
    }
    if raw > MAX_CARBON_KG {
        return Err(EmissionError::TooLarge);
    }

    let carbon_kg = round_to_cents(raw);
    if !carbon_kg.is_finite() {
        return Err(EmissionError::NonFinite);
    }
    if carbon_kg <= 0.0 {
        return Err(EmissionError::NonPositive);
    }

    Ok(Emission {
        carbon_kg,
        points: points_for(carbon_kg),
    })
}

/// Points for a (rounded) carbon amount: 10 per kg, nearest integer.
///
/// Exact for any amount up to `MAX_CARBON_KG`.
pub fn points_for(carbon_kg: f64) -> u64 {
    (carbon_kg * POINTS_PER_KG).round() as u64
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ─── Serializable Factor Table ───────────────────────────────

/// One labelled factor in the published table.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FactorEntry {
    pub label: String,
    pub kg_co2e: f64,
}

/// Full factor table as served to the frontend.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EmissionFactorTable {
    /// kg CO₂e per km, by vehicle
    pub transport: Vec<FactorEntry>,
    /// kg CO₂e per kWh
    pub energy: f64,
    /// kg CO₂e per meal, by meal type
    pub food: Vec<FactorEntry>,
    pub points_per_kg: f64,
}

impl EmissionFactorTable {
    pub fn current() -> Self {
        Self {
            transport: VehicleType::ALL
                .iter()
                .map(|v| FactorEntry {
                    label: v.label().to_string(),
                    kg_co2e: v.factor(),
                })
                .collect(),
            energy: ENERGY_KG_PER_KWH,
            food: MealType::ALL
                .iter()
                .map(|m| FactorEntry {
                    label: m.label().to_string(),
                    kg_co2e: m.factor(),
                })
                .collect(),
            points_per_kg: POINTS_PER_KG,
        }
    }
}

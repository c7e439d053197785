// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Logged activity model for storage and API.

use crate::emissions::{Emission, MealType, VehicleType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Stored activity record in Firestore.
///
/// `carbon_kg` and `points` are always produced by `emissions::calculate`
/// from `details`; no other write path sets them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Activity {
    /// Activity ID (also used as document ID)
    pub id: String,
    /// Owning user ID
    pub user_id: String,
    /// `type` + `data`, adjacently tagged
    #[serde(flatten)]
    pub details: ActivityDetails,
    /// kg CO₂e, 2 decimal places
    pub carbon_kg: f64,
    /// Eco-points awarded
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub points: u64,
    /// Display label ("Transport", "Energy", "Food")
    pub category: String,
    /// Creation time
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    #[serde(with = "crate::time_utils::rfc3339_millis")]
    pub timestamp: DateTime<Utc>,
    /// Calendar date of creation ("YYYY-MM-DD", UTC)
    pub date: String,
}

impl Activity {
    /// Build a new record from validated details and their computed emission.
    pub fn new(user_id: &str, details: ActivityDetails, emission: Emission) -> Self {
        let timestamp = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            category: details.activity_type().category().to_string(),
            details,
            carbon_kg: emission.carbon_kg,
            points: emission.points,
            date: timestamp.format("%Y-%m-%d").to_string(),
            timestamp,
        }
    }

    pub fn activity_type(&self) -> ActivityType {
        self.details.activity_type()
    }
}

/// Closed set of activity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Transport,
    Energy,
    Food,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Transport => "transport",
            ActivityType::Energy => "energy",
            ActivityType::Food => "food",
        }
    }

    /// Capitalized display label.
    pub fn category(self) -> &'static str {
        match self {
            ActivityType::Transport => "Transport",
            ActivityType::Energy => "Energy",
            ActivityType::Food => "Food",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = ActivityInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transport" => Ok(ActivityType::Transport),
            "energy" => Ok(ActivityType::Energy),
            "food" => Ok(ActivityType::Food),
            _ => Err(ActivityInputError::InvalidType),
        }
    }
}

/// Activity payload, one variant per activity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ActivityDetails {
    Transport(TransportData),
    Energy(EnergyData),
    Food(FoodData),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TransportData {
    #[serde(rename = "vehicleType")]
    pub vehicle_type: VehicleType,
    /// Kilometres
    #[serde(default, deserialize_with = "deserialize_quantity")]
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EnergyData {
    /// kWh
    #[serde(
        default,
        alias = "electricity_kWh",
        alias = "electricity_kwh",
        deserialize_with = "deserialize_quantity"
    )]
    pub electricity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FoodData {
    #[serde(rename = "mealType")]
    pub meal_type: MealType,
}

impl ActivityDetails {
    pub fn activity_type(&self) -> ActivityType {
        match self {
            ActivityDetails::Transport(_) => ActivityType::Transport,
            ActivityDetails::Energy(_) => ActivityType::Energy,
            ActivityDetails::Food(_) => ActivityType::Food,
        }
    }

    /// Validate a raw `{type, data}` request body into a typed payload.
    ///
    /// Checks run in order: type in the closed set, data is an object, data
    /// has the shape its type requires.
    pub fn from_request(
        activity_type: Option<&serde_json::Value>,
        data: Option<serde_json::Value>,
    ) -> Result<Self, ActivityInputError> {
        let activity_type: ActivityType = activity_type
            .and_then(|t| t.as_str())
            .ok_or(ActivityInputError::InvalidType)?
            .parse()?;

        let data = match data {
            Some(value @ serde_json::Value::Object(_)) => value,
            _ => return Err(ActivityInputError::MissingData),
        };

        let details = match activity_type {
            ActivityType::Transport => serde_json::from_value(data).map(ActivityDetails::Transport),
            ActivityType::Energy => serde_json::from_value(data).map(ActivityDetails::Energy),
            ActivityType::Food => serde_json::from_value(data).map(ActivityDetails::Food),
        };

        details.map_err(|e| {
            tracing::debug!(activity_type = %activity_type, error = %e, "Rejected activity data");
            ActivityInputError::InvalidData
        })
    }
}

/// Boundary validation failures for `{type, data}` bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActivityInputError {
    #[error("Invalid activity type")]
    InvalidType,

    #[error("Activity data is required")]
    MissingData,

    #[error("Invalid activity data")]
    InvalidData,
}

/// Accept quantities as JSON numbers or numeric strings (HTML form inputs).
fn deserialize_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Quantity {
        Number(f64),
        Text(String),
        Null,
    }

    match Quantity::deserialize(deserializer)? {
        Quantity::Number(n) => Ok(n),
        Quantity::Text(s) if s.trim().is_empty() => Ok(0.0),
        Quantity::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("not a number: {:?}", s))),
        Quantity::Null => Ok(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::SubsecRound;
    use serde_json::json;

    fn parse(
        activity_type: serde_json::Value,
        data: serde_json::Value,
    ) -> Result<ActivityDetails, ActivityInputError> {
        ActivityDetails::from_request(Some(&activity_type), Some(data))
    }

    #[test]
    fn test_parse_transport() {
        let details = parse(json!("transport"), json!({"vehicleType": "SUV", "distance": 12.5}));
        assert_eq!(
            details.unwrap(),
            ActivityDetails::Transport(TransportData {
                vehicle_type: VehicleType::Suv,
                distance: 12.5
            })
        );
    }

    #[test]
    fn test_parse_numeric_strings() {
        let details = parse(json!("transport"), json!({"vehicleType": "Sedan", "distance": "10"}));
        assert_eq!(
            details.unwrap(),
            ActivityDetails::Transport(TransportData {
                vehicle_type: VehicleType::Sedan,
                distance: 10.0
            })
        );

        let details = parse(json!("energy"), json!({"electricity_kWh": " 5.5 "}));
        assert_eq!(
            details.unwrap(),
            ActivityDetails::Energy(EnergyData { electricity: 5.5 })
        );
    }

    #[test]
    fn test_missing_quantity_defaults_to_zero() {
        let details = parse(json!("energy"), json!({})).unwrap();
        assert_eq!(details, ActivityDetails::Energy(EnergyData { electricity: 0.0 }));
    }

    #[test]
    fn test_food_ignores_extra_fields() {
        let details = parse(json!("food"), json!({"mealType": "Vegan", "servings": 3})).unwrap();
        assert_eq!(
            details,
            ActivityDetails::Food(FoodData {
                meal_type: MealType::Vegan
            })
        );
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert_eq!(
            parse(json!("bicycle"), json!({"distance": 3})).unwrap_err(),
            ActivityInputError::InvalidType
        );
        assert_eq!(
            parse(json!(42), json!({})).unwrap_err(),
            ActivityInputError::InvalidType
        );
        assert_eq!(
            ActivityDetails::from_request(None, Some(json!({}))).unwrap_err(),
            ActivityInputError::InvalidType
        );
    }

    #[test]
    fn test_type_is_case_sensitive() {
        assert_eq!(
            parse(json!("Transport"), json!({"vehicleType": "Sedan", "distance": 1})).unwrap_err(),
            ActivityInputError::InvalidType
        );
    }

    #[test]
    fn test_non_object_data_rejected() {
        for data in [json!(null), json!("Sedan"), json!([1, 2]), json!(5)] {
            assert_eq!(
                parse(json!("transport"), data).unwrap_err(),
                ActivityInputError::MissingData
            );
        }
        assert_eq!(
            ActivityDetails::from_request(Some(&json!("food")), None).unwrap_err(),
            ActivityInputError::MissingData
        );
    }

    #[test]
    fn test_unknown_vehicle_or_meal_rejected() {
        assert_eq!(
            parse(json!("transport"), json!({"vehicleType": "Tank", "distance": 3})).unwrap_err(),
            ActivityInputError::InvalidData
        );
        assert_eq!(
            parse(json!("transport"), json!({"distance": 3})).unwrap_err(),
            ActivityInputError::InvalidData
        );
        assert_eq!(
            parse(json!("food"), json!({"mealType": "Carnivore"})).unwrap_err(),
            ActivityInputError::InvalidData
        );
        assert_eq!(
            parse(json!("energy"), json!({"electricity": "lots"})).unwrap_err(),
            ActivityInputError::InvalidData
        );
    }

    #[test]
    fn test_activity_serializes_type_and_data() {
        let details = ActivityDetails::Food(FoodData {
            meal_type: MealType::HighMeat,
        });
        let emission = crate::emissions::calculate(&details).unwrap();
        let activity = Activity::new("user-1", details, emission);

        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["type"], "food");
        assert_eq!(json["data"]["mealType"], "High Meat");
        assert_eq!(json["category"], "Food");
        assert_eq!(json["carbon_kg"], 5.0);
        assert_eq!(json["points"], 50);
        assert_eq!(json["user_id"], "user-1");

        let back: Activity = serde_json::from_value(json).unwrap();
        assert_eq!(back.details, activity.details);
        assert_eq!(back.timestamp, activity.timestamp.trunc_subsecs(3));
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity logging service.
//!
//! Handles the core workflow:
//! 1. Validate the `{type, data}` payload into a typed activity
//! 2. Compute carbon and points on the server (client values are ignored)
//! 3. Store the activity and credit the user's points in one write

use crate::db::Database;
use crate::emissions::{self, Emission, EmissionError};
use crate::error::{AppError, Result};
use crate::models::activity::ActivityInputError;
use crate::models::{Activity, ActivityDetails};

impl From<ActivityInputError> for AppError {
    fn from(err: ActivityInputError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<EmissionError> for AppError {
    fn from(err: EmissionError) -> Self {
        tracing::debug!(reason = %err, "Activity rejected by emission calculator");
        AppError::BadRequest("Invalid activity data".to_string())
    }
}

/// Validate and score a payload without storing anything.
pub fn score(
    activity_type: Option<&serde_json::Value>,
    data: Option<serde_json::Value>,
) -> Result<(ActivityDetails, Emission)> {
    let details = ActivityDetails::from_request(activity_type, data)?;
    let emission = emissions::calculate(&details)?;
    Ok((details, emission))
}

/// Logs activities for authenticated users.
pub struct ActivityLogger {
    db: Database,
}

impl ActivityLogger {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Log an activity for `user_id`.
    ///
    /// Validation failures return `BadRequest` before anything is written.
    pub async fn log_activity(
        &self,
        user_id: &str,
        activity_type: Option<&serde_json::Value>,
        data: Option<serde_json::Value>,
    ) -> Result<Activity> {
        let (details, emission) = score(activity_type, data)?;
        let activity = Activity::new(user_id, details, emission);

        self.db.record_activity(&activity).await?;

        tracing::info!(
            user_id,
            activity_id = %activity.id,
            activity_type = %activity.activity_type(),
            carbon_kg = activity.carbon_kg,
            points = activity.points,
            "Activity logged"
        );

        Ok(activity)
    }
}

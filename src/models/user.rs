// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Monthly carbon budget assigned at registration (kg CO₂e).
pub const DEFAULT_TARGET_KG: f64 = 50.0;

/// User account stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque user ID (also used as document ID)
    pub id: String,
    /// Normalized (trimmed, lowercased) email address
    pub email: String,
    /// PBKDF2 credential, see `services::credentials`
    pub password_hash: String,
    /// Running eco-points total; only ever incremented
    #[serde(default)]
    pub points: u64,
    /// Monthly carbon budget (kg CO₂e)
    #[serde(default = "default_target_kg")]
    pub target_kg: f64,
    /// Registration time
    #[serde(with = "crate::time_utils::rfc3339_millis")]
    pub created_at: DateTime<Utc>,
}

fn default_target_kg() -> f64 {
    DEFAULT_TARGET_KG
}

impl User {
    /// Build a fresh account with zero points and the default goal.
    pub fn new(email: &str, password_hash: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: normalize_email(email),
            password_hash,
            points: 0,
            target_kg: DEFAULT_TARGET_KG,
            created_at: Utc::now(),
        }
    }

    /// Public view of the account (never includes the credential).
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: self.email.clone(),
            points: self.points,
            target_kg: self.target_kg,
            registered_on: self.created_at,
        }
    }

    /// Leaderboard display name: the local part of the email.
    pub fn display_name(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }
}

/// Email uniqueness index entry.
///
/// Stored at `user_emails/{urlencoded email}` and created with
/// create-if-absent semantics, so two registrations for the same address
/// cannot both succeed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEmail {
    pub email: String,
    pub user_id: String,
}

/// User profile returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub points: u64,
    pub target_kg: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    #[serde(with = "crate::time_utils::rfc3339_millis")]
    pub registered_on: DateTime<Utc>,
}

/// Case-insensitive email identity.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults() {
        let user = User::new("  Alice@Example.COM ", "hash".to_string());

        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.points, 0);
        assert_eq!(user.target_kg, DEFAULT_TARGET_KG);
        assert!(!user.id.is_empty());
    }

    #[test]
    fn test_display_name_is_local_part() {
        let user = User::new("green.commuter@example.org", "hash".to_string());
        assert_eq!(user.display_name(), "green.commuter");
    }

    #[test]
    fn test_profile_omits_credential() {
        let user = User::new("bob@example.com", "pbkdf2-sha256$secret".to_string());
        let json = serde_json::to_value(user.profile()).unwrap();

        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "bob@example.com");
        assert_eq!(json["target_kg"], 50.0);
        assert!(json["registered_on"].as_str().unwrap().ends_with('Z'));
    }
}

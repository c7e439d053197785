// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-local document store backed by `DashMap`.
//!
//! Lock order is emails → users → activities. Every method that touches
//! more than one map acquires them in that order.

use crate::db::ResetSummary;
use crate::error::AppError;
use crate::models::{Activity, User, UserEmail};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// In-memory store.
#[derive(Default)]
pub struct MemoryStore {
    emails: DashMap<String, UserEmail>,
    users: DashMap<String, User>,
    activities: DashMap<String, Activity>,
}

impl MemoryStore {
    // ─── User Operations ─────────────────────────────────────────

    pub fn create_user(&self, user: &User) -> Result<(), AppError> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict("User already exists".to_string())),
            Entry::Vacant(slot) => {
                self.users.insert(user.id.clone(), user.clone());
                slot.insert(UserEmail {
                    email: user.email.clone(),
                    user_id: user.id.clone(),
                });
                Ok(())
            }
        }
    }

    pub fn get_user(&self, user_id: &str) -> Option<User> {
        self.users.get(user_id).map(|u| u.clone())
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        let index = self.emails.get(email)?;
        self.users.get(&index.user_id).map(|u| u.clone())
    }

    pub fn update_target_kg(&self, user_id: &str, target_kg: f64) -> Option<User> {
        let mut user = self.users.get_mut(user_id)?;
        user.target_kg = target_kg;
        Some(user.clone())
    }

    // ─── Activity Ledger ─────────────────────────────────────────

    pub fn record_activity(&self, activity: &Activity) -> Result<(), AppError> {
        // Holding the owner's entry makes the insert and increment one step.
        let mut user = self.users.get_mut(&activity.user_id).ok_or_else(|| {
            AppError::NotFound(format!("User {} not found", activity.user_id))
        })?;

        self.activities
            .insert(activity.id.clone(), activity.clone());
        user.points = user.points.saturating_add(activity.points);

        Ok(())
    }

    pub fn get_activities_for_user(&self, user_id: &str) -> Vec<Activity> {
        let mut activities: Vec<Activity> = self
            .activities
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| a.clone())
            .collect();
        activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        activities
    }

    // ─── Leaderboard ─────────────────────────────────────────────

    pub fn get_top_users(&self, limit: usize) -> Vec<User> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|u| u.points > 0)
            .map(|u| u.clone())
            .collect();
        users.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        users.truncate(limit);
        users
    }

    // ─── Administrative ──────────────────────────────────────────

    pub fn list_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.clone()).collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        users
    }

    pub fn list_activities(&self) -> Vec<Activity> {
        let mut activities: Vec<Activity> = self.activities.iter().map(|a| a.clone()).collect();
        activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        activities
    }

    pub fn reset(&self) -> ResetSummary {
        let summary = ResetSummary {
            users: self.users.len(),
            activities: self.activities.len(),
        };

        self.emails.clear();
        self.users.clear();
        self.activities.clear();

        tracing::info!(
            users = summary.users,
            activities = summary.activities,
            "In-memory store reset"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emissions::{calculate, MealType};
    use crate::models::activity::FoodData;
    use crate::models::ActivityDetails;

    fn meal_for(user_id: &str, meal_type: MealType) -> Activity {
        let details = ActivityDetails::Food(FoodData { meal_type });
        let emission = calculate(&details).unwrap();
        Activity::new(user_id, details, emission)
    }

    #[test]
    fn test_duplicate_email_leaves_existing_user() {
        let store = MemoryStore::default();
        let original = User::new("dup@example.com", "first".to_string());
        store.create_user(&original).unwrap();

        let duplicate = User::new("dup@example.com", "second".to_string());
        let err = store.create_user(&duplicate).unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        let found = store.find_user_by_email("dup@example.com").unwrap();
        assert_eq!(found.id, original.id);
        assert_eq!(found.password_hash, "first");
        assert!(store.get_user(&duplicate.id).is_none());
    }

    #[test]
    fn test_record_activity_increments_points() {
        let store = MemoryStore::default();
        let user = User::new("eater@example.com", "hash".to_string());
        store.create_user(&user).unwrap();

        store.record_activity(&meal_for(&user.id, MealType::Vegan)).unwrap();
        store.record_activity(&meal_for(&user.id, MealType::HighMeat)).unwrap();

        assert_eq!(store.get_user(&user.id).unwrap().points, 55);
        assert_eq!(store.get_activities_for_user(&user.id).len(), 2);
    }

    #[test]
    fn test_record_activity_for_missing_user_writes_nothing() {
        let store = MemoryStore::default();

        let err = store
            .record_activity(&meal_for("ghost", MealType::Vegan))
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(store.list_activities().is_empty());
    }

    #[test]
    fn test_update_target_keeps_points() {
        let store = MemoryStore::default();
        let user = User::new("goal@example.com", "hash".to_string());
        store.create_user(&user).unwrap();
        store.record_activity(&meal_for(&user.id, MealType::LowMeat)).unwrap();

        let updated = store.update_target_kg(&user.id, 35.0).unwrap();

        assert_eq!(updated.target_kg, 35.0);
        assert_eq!(updated.points, 30);
        assert!(store.update_target_kg("ghost", 35.0).is_none());
    }

    #[test]
    fn test_reset_clears_everything() {
        let store = MemoryStore::default();
        let user = User::new("reset@example.com", "hash".to_string());
        store.create_user(&user).unwrap();
        store.record_activity(&meal_for(&user.id, MealType::Vegan)).unwrap();

        let summary = store.reset();

        assert_eq!(summary, ResetSummary { users: 1, activities: 1 });
        assert!(store.list_users().is_empty());
        assert!(store.list_activities().is_empty());
        // The email is free again
        store
            .create_user(&User::new("reset@example.com", "hash".to_string()))
            .unwrap();
    }
}

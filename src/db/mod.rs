// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`Database`] is the handle the rest of the crate talks to. It dispatches
//! to Firestore in production or to a process-local store for development
//! and tests. Both backends give the same guarantees: unique emails,
//! activity insert and point increment committed together, and targeted
//! goal updates that never overwrite the point total.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreStore;
pub use memory::MemoryStore;

use crate::config::{Config, DatabaseBackend};
use crate::error::AppError;
use crate::models::{Activity, User};
use serde::Serialize;
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Email uniqueness index (keyed by urlencoded email)
    pub const USER_EMAILS: &str = "user_emails";
    pub const ACTIVITIES: &str = "activities";
}

/// Documents removed by an administrative reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResetSummary {
    pub users: usize,
    pub activities: usize,
}

/// Document store handle.
#[derive(Clone)]
pub struct Database {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreStore),
    Memory(Arc<MemoryStore>),
    Offline,
}

fn offline() -> AppError {
    AppError::Database("Database not connected (offline mode)".to_string())
}

impl Database {
    /// Connect to the backend selected in `config`.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match config.database_backend {
            DatabaseBackend::Firestore => Self::firestore(&config.gcp_project_id).await,
            DatabaseBackend::Memory => {
                tracing::warn!("Using in-memory store; data will not survive a restart");
                Ok(Self::in_memory())
            }
        }
    }

    /// Connect to Firestore (or the emulator if FIRESTORE_EMULATOR_HOST is set).
    pub async fn firestore(project_id: &str) -> Result<Self, AppError> {
        Ok(Self {
            backend: Backend::Firestore(FirestoreStore::new(project_id).await?),
        })
    }

    /// Empty process-local store.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::default())),
        }
    }

    /// Disconnected handle for testing error paths.
    ///
    /// All database operations will return an error if called.
    pub fn new_offline() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match &self.backend {
            Backend::Firestore(_) => "firestore",
            Backend::Memory(_) => "memory",
            Backend::Offline => "offline",
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Create a user. Fails with `Conflict` if the email is taken, leaving
    /// the existing account untouched.
    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.create_user(user).await,
            Backend::Memory(db) => db.create_user(user),
            Backend::Offline => Err(offline()),
        }
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.get_user(user_id).await,
            Backend::Memory(db) => Ok(db.get_user(user_id)),
            Backend::Offline => Err(offline()),
        }
    }

    /// Look up a user by normalized email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.find_user_by_email(email).await,
            Backend::Memory(db) => Ok(db.find_user_by_email(email)),
            Backend::Offline => Err(offline()),
        }
    }

    /// Overwrite a user's monthly target. Returns the updated user, or
    /// `None` if the user does not exist.
    pub async fn update_target_kg(
        &self,
        user_id: &str,
        target_kg: f64,
    ) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.update_target_kg(user_id, target_kg).await,
            Backend::Memory(db) => Ok(db.update_target_kg(user_id, target_kg)),
            Backend::Offline => Err(offline()),
        }
    }

    // ─── Activity Ledger ─────────────────────────────────────────

    /// Store an activity and add its points to the owner's total as one unit.
    ///
    /// Fails with `NotFound` if the owner no longer exists.
    pub async fn record_activity(&self, activity: &Activity) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.record_activity(activity).await,
            Backend::Memory(db) => db.record_activity(activity),
            Backend::Offline => Err(offline()),
        }
    }

    /// All activities for a user, newest first.
    pub async fn get_activities_for_user(&self, user_id: &str) -> Result<Vec<Activity>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.get_activities_for_user(user_id).await,
            Backend::Memory(db) => Ok(db.get_activities_for_user(user_id)),
            Backend::Offline => Err(offline()),
        }
    }

    // ─── Leaderboard ─────────────────────────────────────────────

    /// Users with points, highest first, at most `limit`.
    pub async fn get_top_users(&self, limit: usize) -> Result<Vec<User>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.get_top_users(limit).await,
            Backend::Memory(db) => Ok(db.get_top_users(limit)),
            Backend::Offline => Err(offline()),
        }
    }

    // ─── Administrative ──────────────────────────────────────────

    /// All users, newest first.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.list_users().await,
            Backend::Memory(db) => Ok(db.list_users()),
            Backend::Offline => Err(offline()),
        }
    }

    /// All activities, newest first.
    pub async fn list_activities(&self) -> Result<Vec<Activity>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.list_activities().await,
            Backend::Memory(db) => Ok(db.list_activities()),
            Backend::Offline => Err(offline()),
        }
    }

    /// Delete every user, email index entry and activity.
    pub async fn reset(&self) -> Result<ResetSummary, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.reset().await,
            Backend::Memory(db) => Ok(db.reset()),
            Backend::Offline => Err(offline()),
        }
    }
}

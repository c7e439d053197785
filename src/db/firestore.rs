// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (accounts and point totals)
//! - User emails (uniqueness index)
//! - Activities (logged activities with computed emissions)

use crate::db::{collections, ResetSummary};
use crate::error::AppError;
use crate::models::{Activity, User, UserEmail};
use firestore::errors::FirestoreError;
use firestore::FirestoreWritePrecondition;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore-backed store.
#[derive(Clone)]
pub struct FirestoreStore {
    client: firestore::FirestoreDb,
}

/// Document ID for an email index entry.
fn email_doc_id(email: &str) -> String {
    urlencoding::encode(email).into_owned()
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Create a user and claim its email.
    ///
    /// The email index document is created first with create-if-absent
    /// semantics; a conflict there means the address is taken and nothing
    /// else is written.
    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let index = UserEmail {
            email: user.email.clone(),
            user_id: user.id.clone(),
        };
        let index_id = email_doc_id(&user.email);

        let claimed: Result<UserEmail, FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(collections::USER_EMAILS)
            .document_id(&index_id)
            .object(&index)
            .execute()
            .await;

        match claimed {
            Ok(_) => {}
            Err(FirestoreError::DataConflictError(_)) => {
                return Err(AppError::Conflict("User already exists".to_string()));
            }
            Err(e) => return Err(AppError::Database(e.to_string())),
        }

        let created: Result<User, FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await;

        if let Err(e) = created {
            // Release the email so the address is not locked out.
            if let Err(cleanup) = self
                .client
                .fluent()
                .delete()
                .from(collections::USER_EMAILS)
                .document_id(&index_id)
                .execute()
                .await
            {
                tracing::error!(error = %cleanup, email = %user.email, "Failed to release email index");
            }
            return Err(AppError::Database(e.to_string()));
        }

        Ok(())
    }

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by normalized email via the uniqueness index.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let index: Option<UserEmail> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::USER_EMAILS)
            .obj()
            .one(&email_doc_id(email))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match index {
            Some(index) => self.get_user(&index.user_id).await,
            None => Ok(None),
        }
    }

    /// Update only the `target_kg` field.
    ///
    /// A field mask is used so a concurrent point increment is never
    /// overwritten by the stale copy read here.
    pub async fn update_target_kg(
        &self,
        user_id: &str,
        target_kg: f64,
    ) -> Result<Option<User>, AppError> {
        let Some(mut user) = self.get_user(user_id).await? else {
            return Ok(None);
        };
        user.target_kg = target_kg;

        let updated: User = self
            .client
            .fluent()
            .update()
            .fields(["target_kg"])
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(&user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Some(updated))
    }

    // ─── Activity Ledger ─────────────────────────────────────────

    /// Atomically store an activity and increment its owner's points.
    ///
    /// The activity write and a server-side `increment` transform on the
    /// user document are committed in one transaction, so either both land
    /// or neither does, and concurrent increments never lose updates.
    ///
    /// The increment carries an `exists` precondition. If the user document
    /// is missing at commit time (never created, or deleted after the
    /// caller authenticated) the whole transaction fails with `NotFound`
    /// and no partial user document is created.
    pub async fn record_activity(&self, activity: &Activity) -> Result<(), AppError> {
        let user_id = activity.user_id.as_str();
        let increment = i64::try_from(activity.points)
            .map_err(|_| AppError::BadRequest("Invalid activity data".to_string()))?;

        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        self.client
            .fluent()
            .update()
            .in_col(collections::ACTIVITIES)
            .document_id(&activity.id)
            .object(activity)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add activity to transaction: {}", e))
            })?;

        self.client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(user_id)
            .transforms(|t| t.fields([t.field("points").increment(increment)]))
            .only_transform()
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add points to transaction: {}", e))
            })?;

        match transaction.commit().await {
            Ok(_) => Ok(()),
            Err(FirestoreError::DataNotFoundError(_)) => {
                tracing::warn!(
                    user_id,
                    activity_id = %activity.id,
                    "User not found, activity not recorded"
                );
                Err(AppError::NotFound(format!("User {} not found", user_id)))
            }
            Err(e) => Err(AppError::Database(format!(
                "Transaction commit failed: {}",
                e
            ))),
        }
    }

    /// Get all activities for a user, newest first.
    pub async fn get_activities_for_user(&self, user_id: &str) -> Result<Vec<Activity>, AppError> {
        let user_id = user_id.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .order_by([("timestamp", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Leaderboard ─────────────────────────────────────────────

    /// Users with points > 0, ordered by points descending.
    pub async fn get_top_users(&self, limit: usize) -> Result<Vec<User>, AppError> {
        let limit = u32::try_from(limit).unwrap_or(u32::MAX);
        self.client
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("points").greater_than(0)]))
            .order_by([("points", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Administrative ──────────────────────────────────────────

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn list_activities(&self) -> Result<Vec<Activity>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .order_by([("timestamp", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete every user, email index entry and activity.
    pub async fn reset(&self) -> Result<ResetSummary, AppError> {
        let activities = self.list_activities().await?;
        self.batch_delete(&activities, collections::ACTIVITIES, |a: &Activity| {
            a.id.clone()
        })
        .await?;
        tracing::debug!(count = activities.len(), "Deleted activities");

        let emails: Vec<UserEmail> = self
            .client
            .fluent()
            .select()
            .from(collections::USER_EMAILS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        self.batch_delete(&emails, collections::USER_EMAILS, |e: &UserEmail| {
            email_doc_id(&e.email)
        })
        .await?;
        tracing::debug!(count = emails.len(), "Deleted email index entries");

        let users = self.list_users().await?;
        self.batch_delete(&users, collections::USERS, |u: &User| u.id.clone())
            .await?;
        tracing::debug!(count = users.len(), "Deleted users");

        let summary = ResetSummary {
            users: users.len(),
            activities: activities.len(),
        };
        tracing::info!(
            users = summary.users,
            activities = summary.activities,
            "Firestore reset complete"
        );

        Ok(summary)
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = self
                .client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                self.client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_doc_id_is_path_safe() {
        assert_eq!(email_doc_id("a.b@example.com"), "a.b%40example.com");
        assert!(!email_doc_id("weird/name@example.com").contains('/'));
    }
}

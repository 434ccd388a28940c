// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed user operations.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Exercise, User};
use firestore::errors::FirestoreError;
use firestore::{FirestoreConsistencySelector, FirestoreQueryDirection};

/// Commit attempts for a log append before giving up on contention.
const MAX_APPEND_ATTEMPTS: u32 = 3;

/// Outcome of one transactional append attempt.
enum AppendAttempt {
    Done(Option<User>),
    Conflict(String),
}

/// True when Firestore aborted the transaction because of contention.
///
/// An aborted transaction wrote nothing, so the append can run again. Other
/// failures (deadlines, transport errors) may hide a commit that did land.
fn is_contention(err: &FirestoreError) -> bool {
    matches!(
        err,
        FirestoreError::DatabaseError(db_err) if db_err.public.code.eq_ignore_ascii_case("aborted")
    )
}

/// Route a transactional failure to a retry or a hard database error.
fn classify(err: FirestoreError, context: &str) -> Result<AppendAttempt, AppError> {
    if is_contention(&err) {
        Ok(AppendAttempt::Conflict(err.to_string()))
    } else {
        Err(AppError::Database(format!("{}: {}", context, err)))
    }
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator needs no credentials; skip the default token lookup.
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

    /// Insert a new user document. Fails if the ID is already taken.
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let _: User = self
            .client
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get all users, oldest first.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([("created_at", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
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

    // ─── Atomic Log Append ──────────────────────────────────────

    /// Atomically append an exercise to a user's log.
    ///
    /// The user document is read through the transaction, so a concurrent
    /// append to the same user makes the commit fail rather than silently
    /// dropping one of the entries. Conflicts are retried with fresh data.
    ///
    /// Returns the updated user, or `None` if no such user exists.
    pub async fn append_exercise(
        &self,
        user_id: &str,
        exercise: &Exercise,
    ) -> Result<Option<User>, AppError> {
        let mut last_conflict = String::new();

        for attempt in 1..=MAX_APPEND_ATTEMPTS {
            match self.try_append_exercise(user_id, exercise).await? {
                AppendAttempt::Done(user) => return Ok(user),
                AppendAttempt::Conflict(err) => {
                    tracing::warn!(
                        user_id,
                        attempt,
                        error = %err,
                        "Log append transaction conflicted, retrying"
                    );
                    last_conflict = err;
                }
            }
        }

        Err(AppError::Database(format!(
            "Log append failed after {} attempts: {}",
            MAX_APPEND_ATTEMPTS, last_conflict
        )))
    }

    async fn try_append_exercise(
        &self,
        user_id: &str,
        exercise: &Exercise,
    ) -> Result<AppendAttempt, AppError> {
        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // Reads through this handle are part of the transaction and register
        // the document for conflict detection.
        let tx_client = self
            .client
            .clone_with_consistency_selector(FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ));

        let current: Option<User> = match tx_client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
        {
            Ok(current) => current,
            Err(e) => {
                let _ = transaction.rollback().await;
                return classify(e, "Failed to read user in transaction");
            }
        };

        let Some(mut user) = current else {
            let _ = transaction.rollback().await;
            return Ok(AppendAttempt::Done(None));
        };

        user.log.push(exercise.clone());

        self.client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add user to transaction: {}", e)))?;

        match transaction.commit().await {
            Ok(_) => {
                tracing::debug!(
                    user_id,
                    log_len = user.log.len(),
                    "Exercise appended atomically"
                );
                Ok(AppendAttempt::Done(Some(user)))
            }
            Err(e) => classify(e, "Failed to commit log append"),
        }
    }
}

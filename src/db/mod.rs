// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`Database`] is the single storage handle shared by all handlers. It owns
//! ID generation and creation timestamps, and dispatches to Firestore, an
//! in-memory store, or an offline stub that fails every call.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::config::{Config, StorageBackend};
use crate::error::AppError;
use crate::models::{Exercise, User};
use crate::time_utils::format_utc_rfc3339;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
}

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreDb),
    Memory(MemoryStore),
    Offline,
}

/// Storage handle, cheap to clone.
#[derive(Clone)]
pub struct Database {
    backend: Backend,
}

impl Database {
    /// Connect to the backend selected in `config`.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match config.storage_backend {
            StorageBackend::Firestore => {
                let db = FirestoreDb::new(&config.gcp_project_id).await?;
                Ok(Self {
                    backend: Backend::Firestore(db),
                })
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data will not survive a restart");
                Ok(Self::new_in_memory())
            }
        }
    }

    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(MemoryStore::new()),
        }
    }

    /// Create a disconnected handle for testing.
    ///
    /// All database operations will return an error if called.
    pub fn new_offline() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    fn offline_error() -> AppError {
        AppError::Database("Database not connected (offline mode)".to_string())
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Create a user with an empty log and a fresh storage ID.
    pub async fn create_user(&self, username: &str) -> Result<User, AppError> {
        let user = User {
            id: uuid::Uuid::new_v4().simple().to_string(),
            username: username.to_string(),
            log: Vec::new(),
            created_at: format_utc_rfc3339(chrono::Utc::now()),
        };

        match &self.backend {
            Backend::Firestore(db) => db.insert_user(&user).await?,
            Backend::Memory(store) => {
                if !store.insert_user(&user) {
                    return Err(AppError::Database(format!(
                        "User ID collision: {}",
                        user.id
                    )));
                }
            }
            Backend::Offline => return Err(Self::offline_error()),
        }

        tracing::info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    /// Get all users in creation order.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.list_users().await,
            Backend::Memory(store) => Ok(store.list_users()),
            Backend::Offline => Err(Self::offline_error()),
        }
    }

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.get_user(user_id).await,
            Backend::Memory(store) => Ok(store.get_user(user_id)),
            Backend::Offline => Err(Self::offline_error()),
        }
    }

    /// Atomically append an exercise to a user's log.
    ///
    /// Returns the updated user, or `None` if the user does not exist.
    pub async fn append_exercise(
        &self,
        user_id: &str,
        exercise: &Exercise,
    ) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.append_exercise(user_id, exercise).await,
            Backend::Memory(store) => Ok(store.append_exercise(user_id, exercise)),
            Backend::Offline => Err(Self::offline_error()),
        }
    }
}

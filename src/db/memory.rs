// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-local user store for local development and tests.

use crate::models::{Exercise, User};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

struct StoredUser {
    /// Insertion sequence number; orders listings
    seq: u64,
    user: User,
}

/// In-memory user store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<DashMap<String, StoredUser>>,
    next_seq: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user. Returns `false` if the ID is already taken.
    pub fn insert_user(&self, user: &User) -> bool {
        match self.users.entry(user.id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(StoredUser {
                    seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                    user: user.clone(),
                });
                true
            }
        }
    }

    /// All users in insertion order.
    pub fn list_users(&self) -> Vec<User> {
        let mut users: Vec<(u64, User)> = self
            .users
            .iter()
            .map(|e| (e.seq, e.user.clone()))
            .collect();
        users.sort_by_key(|(seq, _)| *seq);
        users.into_iter().map(|(_, user)| user).collect()
    }

    pub fn get_user(&self, user_id: &str) -> Option<User> {
        self.users.get(user_id).map(|e| e.user.clone())
    }

    /// Append under the entry's shard lock so concurrent appends can't race.
    pub fn append_exercise(&self, user_id: &str, exercise: &Exercise) -> Option<User> {
        self.users.get_mut(user_id).map(|mut entry| {
            entry.user.log.push(exercise.clone());
            entry.user.clone()
        })
    }
}

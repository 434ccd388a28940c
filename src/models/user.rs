// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User and exercise models for storage and API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// User document stored in Firestore.
///
/// The exercise log is embedded rather than kept in its own collection, so a
/// single document read returns everything a log query needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Storage-assigned ID (also used as document ID)
    pub id: String,
    pub username: String,
    /// Exercises in insertion order
    #[serde(default)]
    pub log: Vec<Exercise>,
    /// When the user was created (RFC3339); orders user listings
    pub created_at: String,
}

/// One exercise entry in a user's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub description: Option<String>,
    /// Duration in minutes, possibly fractional
    pub duration: Option<f64>,
    /// Stored as `YYYY-MM-DD`
    pub date: NaiveDate,
}

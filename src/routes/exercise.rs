// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Exercise tracker API routes.

use crate::error::{AppError, Result};
use crate::models::{Exercise, User};
use crate::routes::extract::{FormOrJson, QueryParams};
use crate::services::LogFilter;
use crate::time_utils::{format_display_date, parse_iso_date, today_utc};
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/exercise/new-user", post(create_user))
        .route("/api/exercise/users", get(list_users))
        .route("/api/exercise/add", post(add_exercise))
        .route("/api/exercise/log", get(get_log))
}

/// User identity as returned by the API (log omitted).
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// Treat a missing or empty `userId` as absent.
fn require_user_id(raw: Option<&str>) -> Result<&str> {
    raw.filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest(AppError::UNKNOWN_USER_ID.to_string()))
}

// ─── Users ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct NewUserBody {
    #[serde(default)]
    username: String,
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    FormOrJson(body): FormOrJson<NewUserBody>,
) -> Result<Json<UserSummary>> {
    let user = state.db.create_user(&body.username).await?;
    Ok(Json(user.into()))
}

async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<UserSummary>>> {
    let users = state.db.list_users().await?;
    tracing::debug!(count = users.len(), "Listing users");
    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

// ─── Add Exercise ────────────────────────────────────────────

#[derive(Deserialize)]
struct AddExerciseBody {
    #[serde(rename = "userId")]
    user_id: Option<String>,
    description: Option<String>,
    /// Number in JSON bodies, text in form posts.
    duration: Option<Value>,
    date: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct AddExerciseResponse {
    pub id: String,
    pub username: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Minutes may be fractional; they must be finite and not negative.
fn parse_duration(raw: Option<Value>) -> Result<Option<f64>> {
    let invalid = || AppError::BadRequest(AppError::INVALID_DURATION.to_string());

    let minutes = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(invalid)?,
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| invalid())?,
        Some(_) => return Err(invalid()),
    };

    if minutes.is_finite() && minutes >= 0.0 {
        Ok(Some(minutes))
    } else {
        Err(invalid())
    }
}

/// Render whole minutes as integers (`30`, not `30.0`).
fn duration_number(minutes: f64) -> Option<Number> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

    if minutes.fract() == 0.0 && minutes.abs() <= MAX_EXACT {
        Some(Number::from(minutes as i64))
    } else {
        Number::from_f64(minutes)
    }
}

/// Resolve the entry date, defaulting to today (UTC) when absent or empty.
fn parse_entry_date(raw: Option<&str>) -> Result<chrono::NaiveDate> {
    match raw {
        None | Some("") => Ok(today_utc()),
        Some(raw) => parse_iso_date(raw)
            .ok_or_else(|| AppError::BadRequest(AppError::INVALID_DATE.to_string())),
    }
}

async fn add_exercise(
    State(state): State<Arc<AppState>>,
    FormOrJson(body): FormOrJson<AddExerciseBody>,
) -> Result<Json<AddExerciseResponse>> {
    let user_id = require_user_id(body.user_id.as_deref())?;

    let exercise = Exercise {
        description: body.description,
        duration: parse_duration(body.duration)?,
        date: parse_entry_date(body.date.as_deref())?,
    };

    let user = state
        .db
        .append_exercise(user_id, &exercise)
        .await?
        .ok_or_else(|| AppError::NotFound(AppError::USER_NOT_FOUND.to_string()))?;

    tracing::info!(
        user_id,
        date = %exercise.date,
        log_len = user.log.len(),
        "Exercise added"
    );

    Ok(Json(AddExerciseResponse {
        id: user.id,
        username: user.username,
        date: format_display_date(exercise.date),
        duration: exercise.duration.and_then(duration_number),
        description: exercise.description,
    }))
}

// ─── Exercise Log ────────────────────────────────────────────

#[derive(Deserialize)]
struct LogQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
    from: Option<String>,
    to: Option<String>,
    limit: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct LogEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<Number>,
    pub date: String,
}

impl From<Exercise> for LogEntry {
    fn from(exercise: Exercise) -> Self {
        Self {
            description: exercise.description,
            duration: exercise.duration.and_then(duration_number),
            date: format_display_date(exercise.date),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct LogResponse {
    pub id: String,
    pub username: String,
    pub count: usize,
    pub log: Vec<LogEntry>,
}

/// Get a user's exercise log, newest first.
///
/// Validation failures and unknown users are reported as `{ "error": ... }`
/// with 200 OK; only a missing `userId` is a 400.
async fn get_log(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<LogQuery>,
) -> Result<Json<LogResponse>> {
    let user_id = require_user_id(params.user_id.as_deref())?;
    let filter = LogFilter::parse(
        params.from.as_deref(),
        params.to.as_deref(),
        params.limit.as_deref(),
    )?;

    tracing::debug!(
        user_id,
        from = ?filter.from,
        to = ?filter.to,
        limit = ?filter.limit,
        "Fetching exercise log"
    );

    let user = state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::Rejected(AppError::USER_NOT_FOUND.to_string()))?;

    let entries = filter.apply(&user.log);

    Ok(Json(LogResponse {
        id: user.id,
        username: user.username,
        count: entries.len(),
        log: entries.into_iter().map(LogEntry::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_duration_accepts_numbers_and_text() {
        assert_eq!(parse_duration(None).unwrap(), None);
        assert_eq!(parse_duration(Some(Value::Null)).unwrap(), None);
        assert_eq!(parse_duration(Some(json!(45))).unwrap(), Some(45.0));
        assert_eq!(parse_duration(Some(json!(12.5))).unwrap(), Some(12.5));
        assert_eq!(parse_duration(Some(json!("30"))).unwrap(), Some(30.0));
        assert_eq!(parse_duration(Some(json!(" 7.25 "))).unwrap(), Some(7.25));
        assert_eq!(parse_duration(Some(json!(""))).unwrap(), None);
    }

    #[test]
    fn test_parse_duration_rejects_non_numbers() {
        for raw in [
            json!("abc"),
            json!("NaN"),
            json!("inf"),
            json!(-3),
            json!("-0.5"),
            json!(true),
            json!([1]),
        ] {
            let err = parse_duration(Some(raw.clone())).unwrap_err();
            assert!(
                matches!(&err, AppError::BadRequest(msg) if msg == AppError::INVALID_DURATION),
                "{raw} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn test_duration_number_keeps_whole_minutes_integral() {
        assert_eq!(duration_number(30.0), Some(Number::from(30)));
        assert_eq!(duration_number(12.5), Number::from_f64(12.5));
        assert_eq!(json!(duration_number(0.0)), json!(0));
        assert_eq!(json!(duration_number(12.5)), json!(12.5));
    }

    #[test]
    fn test_entry_date_defaults_to_today() {
        assert_eq!(parse_entry_date(None).unwrap(), today_utc());
        assert_eq!(parse_entry_date(Some("")).unwrap(), today_utc());
        assert_eq!(
            parse_entry_date(Some("2024-01-05")).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert!(matches!(
            parse_entry_date(Some("Jan 5")),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_require_user_id() {
        assert_eq!(require_user_id(Some("abc")).unwrap(), "abc");
        assert!(matches!(require_user_id(Some("")), Err(AppError::BadRequest(_))));
        assert!(matches!(require_user_id(None), Err(AppError::BadRequest(_))));
    }
}

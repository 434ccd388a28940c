// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Exercise log query pipeline.
//!
//! Filters are parsed from raw query strings into a [`LogFilter`], then
//! applied to an owned copy of a user's log: newest first, optional date
//! bounds (inclusive), optional count limit.

use crate::error::{AppError, Result};
use crate::models::Exercise;
use crate::time_utils::parse_iso_date;
use chrono::NaiveDate;
use std::num::IntErrorKind;

/// Validated log query filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogFilter {
    /// Keep entries on or after this date
    pub from: Option<NaiveDate>,
    /// Keep entries on or before this date
    pub to: Option<NaiveDate>,
    /// Keep at most this many entries
    pub limit: Option<usize>,
}

impl LogFilter {
    /// Validate raw query parameters.
    ///
    /// Only parameters that are present are checked: `limit` first, then
    /// `from`, then `to`. Failures are [`AppError::Rejected`] so they reach
    /// the client in-band. A limit of zero means no limit; a limit too large
    /// for `usize` is clamped to `usize::MAX`.
    pub fn parse(from: Option<&str>, to: Option<&str>, limit: Option<&str>) -> Result<Self> {
        let limit = limit
            .map(|raw| match raw.parse::<usize>() {
                Ok(n) => Ok(n),
                Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(usize::MAX),
                Err(_) => Err(AppError::Rejected(AppError::INVALID_LIMIT.to_string())),
            })
            .transpose()?
            .filter(|&n| n > 0);

        let parse_bound = |raw: &str| {
            parse_iso_date(raw).ok_or_else(|| AppError::Rejected(AppError::INVALID_DATE.to_string()))
        };

        let from = from.map(parse_bound).transpose()?;
        let to = to.map(parse_bound).transpose()?;

        Ok(Self { from, to, limit })
    }

    /// Apply the filter to a log, leaving the input untouched.
    pub fn apply(&self, log: &[Exercise]) -> Vec<Exercise> {
        let mut entries = log.to_vec();

        // Stable sort: same-day entries keep their insertion order.
        entries.sort_by(|a, b| b.date.cmp(&a.date));

        if let Some(from) = self.from {
            entries.retain(|e| e.date >= from);
        }
        if let Some(to) = self.to {
            entries.retain(|e| e.date <= to);
        }
        if let Some(limit) = self.limit {
            entries.truncate(limit);
        }

        entries
    }
}

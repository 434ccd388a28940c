// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date parsing and formatting.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Length of a `YYYY-MM-DD` date string.
const ISO_DATE_LEN: usize = 10;

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Format a calendar date for API responses, e.g. `Fri Jan 05 2024`.
pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%a %b %d %Y").to_string()
}

/// Current calendar date in UTC.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse a strict `YYYY-MM-DD` date.
///
/// Returns `None` for anything that is not exactly four digits, dash, two
/// digits, dash, two digits, or that names a day that does not exist.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let bytes = raw.as_bytes();
    if bytes.len() != ISO_DATE_LEN {
        return None;
    }

    let shape_ok = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shape_ok {
        return None;
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

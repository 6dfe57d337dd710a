// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Calendar date format used for busy-day keys.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Format a UTC timestamp as RFC3339 with millisecond precision and a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Post document key: the creation time in Unix milliseconds.
pub fn post_key(created_at: DateTime<Utc>) -> String {
    created_at.timestamp_millis().to_string()
}

/// Parse a `YYYY-MM-DD` busy-day key.
pub fn parse_date_key(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_KEY_FORMAT)
        .ok()
        // Reject non-canonical forms such as "2025-1-5"
        .filter(|date| date.format(DATE_KEY_FORMAT).to_string() == raw)
}

// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};

use crate::models::CheckIn;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// The calendar date of a server timestamp in `tz`.
///
/// Timestamps with an offset are converted into `tz`. Timestamps without one
/// are taken as already being local. Anything unparseable yields `None`.
pub fn local_date<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(tz).date_naive());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|dt| dt.date())
}

/// Whether any of `check_ins` falls on the same local calendar day as `now`.
///
/// This compares year, month and day in `now`'s time zone; it is not a
/// rolling 24 hour window.
pub fn has_checked_in_today<Tz: TimeZone>(check_ins: &[CheckIn], now: &DateTime<Tz>) -> bool {
    let today = now.date_naive();
    let tz = now.timezone();
    check_ins
        .iter()
        .any(|check_in| local_date(&check_in.created_at, &tz) == Some(today))
}

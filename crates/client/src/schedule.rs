// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use chrono::{DateTime, Days, TimeZone};

use crate::{error::ValidationError, models::Membership};

/// The next time the member's daily reminder fires, strictly after `now`.
///
/// Returns `Ok(None)` when the membership has no reminder time. Local times
/// skipped by a DST transition move to the following day.
pub fn next_reminder<Tz: TimeZone>(
    membership: &Membership,
    now: &DateTime<Tz>,
) -> Result<Option<DateTime<Tz>>, ValidationError> {
    let Some(time) = membership.reminder_time()? else {
        return Ok(None);
    };
    let tz = now.timezone();
    let today = now.date_naive();
    for offset in 0..3 {
        let Some(date) = today.checked_add_days(Days::new(offset)) else {
            break;
        };
        if let Some(candidate) = tz.from_local_datetime(&date.and_time(time)).earliest() {
            if candidate > *now {
                return Ok(Some(candidate));
            }
        }
    }
    Ok(None)
}

/// 1-based day of the challenge program the member is on, counted in local
/// calendar days from the membership start. `None` before the start or when
/// the start is unknown.
pub fn program_day<Tz: TimeZone>(membership: &Membership, now: &DateTime<Tz>) -> Option<u32> {
    let started = membership
        .started_at?
        .with_timezone(&now.timezone())
        .date_naive();
    let elapsed = now.date_naive().signed_duration_since(started).num_days();
    u32::try_from(elapsed).ok().map(|days| days + 1)
}

// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{decode::null_as_empty, error::ValidationError};

const MAX_TITLE_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 2_000;

/* =========================
 * CHALLENGES
 * ========================= */

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ChallengeSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub member_count: u32,
    pub self_paced: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Challenge {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub owner_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// How often members are expected to check in, e.g. `DAILY`
    pub frequency: Option<String>,
    pub member_count: u32,
    pub self_paced: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Program {
    pub challenge_id: i64,
    #[serde(deserialize_with = "null_as_empty")]
    pub days: Vec<ProgramDay>,
}

impl Program {
    pub fn day(&self, day_number: u32) -> Option<&ProgramDay> {
        self.days.iter().find(|d| d.day_number == day_number)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgramDay {
    pub day_number: u32,
    pub title: String,
    pub body: String,
}

/* =========================
 * MEMBERSHIPS
 * ========================= */

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Membership {
    pub id: i64,
    pub user_id: String,
    pub challenge_id: i64,
    /// Only set for self-paced challenges
    pub cohort_id: Option<i64>,
    pub started_at: Option<DateTime<Utc>>,
    pub notification_hour: Option<i32>,
    pub notification_minute: Option<i32>,
}

impl Membership {
    /// The preferred daily reminder time, if one is set.
    pub fn reminder_time(&self) -> Result<Option<NaiveTime>, ValidationError> {
        let (Some(hour), Some(minute)) = (self.notification_hour, self.notification_minute) else {
            return Ok(None);
        };
        if !(0..24).contains(&hour) {
            return Err(ValidationError::ReminderHour(hour));
        }
        if !(0..60).contains(&minute) {
            return Err(ValidationError::ReminderMinute(minute));
        }
        Ok(NaiveTime::from_hms_opt(hour as u32, minute as u32, 0))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct MembershipToggle {
    /// `true` after joining, `false` after leaving
    pub joined: bool,
}

/* =========================
 * CHECK-INS
 * ========================= */

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckIn {
    pub id: i64,
    pub user_id: String,
    pub challenge_id: i64,
    /// Kept as sent by the server; unparseable values never count as today
    pub created_at: String,
    pub body: String,
    pub attachment: Option<Attachment>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub url: String,
    pub kind: AttachmentKind,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Video,
}

/* =========================
 * NEW CHALLENGES
 * ========================= */

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChallengeDraft {
    pub title: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub frequency: Option<String>,
    pub self_paced: bool,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ChallengeDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::Empty("title"));
        }
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::TooLong {
                field: "title",
                max: MAX_TITLE_LEN,
            });
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::Empty("description"));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(ValidationError::TooLong {
                field: "description",
                max: MAX_DESCRIPTION_LEN,
            });
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(ValidationError::EndBeforeStart);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ChallengeDraft {
        ChallengeDraft {
            title: "30 days of push-ups".to_string(),
            description: "One set every morning".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_membership_with_only_id_decodes() {
        let membership: Membership =
            serde_json::from_str(r#"{"id": 1, "cohortId": null}"#).unwrap();
        assert_eq!(membership.id, 1);
        assert_eq!(membership.cohort_id, None);
        assert_eq!(membership.reminder_time(), Ok(None));
    }

    #[test]
    fn test_reminder_time_range() {
        let mut membership = Membership {
            notification_hour: Some(7),
            notification_minute: Some(30),
            ..Default::default()
        };
        assert_eq!(
            membership.reminder_time(),
            Ok(NaiveTime::from_hms_opt(7, 30, 0))
        );
        membership.notification_hour = Some(24);
        assert_eq!(
            membership.reminder_time(),
            Err(ValidationError::ReminderHour(24))
        );
        membership.notification_hour = Some(0);
        membership.notification_minute = Some(60);
        assert_eq!(
            membership.reminder_time(),
            Err(ValidationError::ReminderMinute(60))
        );
    }

    #[test]
    fn test_check_in_attachment_decodes() {
        let check_in: CheckIn = serde_json::from_str(
            r#"{
                "id": 9,
                "userId": "user_1",
                "challengeId": 4,
                "createdAt": "2024-06-01T09:00:00",
                "body": "Done!",
                "attachment": { "url": "https://cdn.example.org/a.jpg", "kind": "image" }
            }"#,
        )
        .unwrap();
        let attachment = check_in.attachment.unwrap();
        assert_eq!(attachment.kind, AttachmentKind::Image);
        assert_eq!(attachment.width, None);
    }

    #[test]
    fn test_program_null_days() {
        let program: Program = serde_json::from_str(r#"{"challengeId": 3, "days": null}"#).unwrap();
        assert!(program.days.is_empty());
        assert!(program.day(1).is_none());
    }

    #[test]
    fn test_draft_validation() {
        assert_eq!(draft().validate(), Ok(()));

        let mut missing_title = draft();
        missing_title.title = "  ".to_string();
        assert_eq!(
            missing_title.validate(),
            Err(ValidationError::Empty("title"))
        );

        let mut long_title = draft();
        long_title.title = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(matches!(
            long_title.validate(),
            Err(ValidationError::TooLong { field: "title", .. })
        ));

        let mut backwards = draft();
        backwards.start_date = NaiveDate::from_ymd_opt(2024, 6, 10);
        backwards.end_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        assert_eq!(backwards.validate(), Err(ValidationError::EndBeforeStart));
    }
}

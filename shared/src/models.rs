//! Shared data models.
//!
//! Store items are JSON-shaped (see [`crate::store`]); the record types here
//! decode them with serde using the attribute names already in the table.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Language assumed when a stored time carries none.
pub const DEFAULT_LANGUAGE: &str = "english";

/// One mass (or confession) slot on a given day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub time: NaiveTime,
    pub language: String,
}

impl ScheduleEntry {
    pub fn new(time: NaiveTime, language: impl Into<String>) -> Self {
        Self {
            time,
            language: language.into(),
        }
    }

    pub fn english(time: NaiveTime) -> Self {
        Self::new(time, DEFAULT_LANGUAGE)
    }

    pub fn is_english(&self) -> bool {
        self.language.eq_ignore_ascii_case(DEFAULT_LANGUAGE)
    }
}

/// How a holy day's own masses combine with the regular weekday masses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MassMode {
    /// Holy-day masses are added to the weekday schedule
    Supplement,
    /// Holy-day masses stand in for the weekday schedule
    #[default]
    Replace,
}

/// Schedule record under `event:mass:daily:<n>` or `event:mass:holyday:<id>`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRecord {
    #[serde(default)]
    pub event_times: Vec<String>,
    #[serde(default)]
    pub mass_mode: MassMode,
    pub event_year: Option<i32>,
    pub event_month: Option<u32>,
    pub event_day: Option<u32>,
}

impl ScheduleRecord {
    /// Explicit calendar date carried by the record, if complete and valid.
    pub fn event_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.event_year?, self.event_month?, self.event_day?)
    }
}

/// Confession record (scanned by `eventCategory = confession`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfessionRecord {
    /// Weekday index, Monday = 0
    pub day_enum: u32,
    pub day_name: String,
    #[serde(default)]
    pub event_times: Vec<String>,
}

/// Parish calendar event (scanned by `eventCategory = calendar`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarRecord {
    pub event_title: String,
    pub event_year: i32,
    pub event_month: u32,
    pub event_day: u32,
    /// "HH:MM"
    pub event_time_start: String,
    /// "HH:MM"
    pub event_time_end: Option<String>,
}

/// Recorded talk (scanned by `eventCategory = talk`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TalkRecord {
    pub namespace: String,
    pub url: String,
    pub event_title: String,
    pub event_year: i32,
    pub event_month: u32,
    pub event_day: u32,
}

impl TalkRecord {
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.event_year, self.event_month, self.event_day)
    }
}

/// Parish office info under `info:office:phone`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneRecord {
    pub phone_number: String,
}

/// Per-listener persistent attributes, keyed by the Alexa user id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub last_token: String,
    #[serde(default)]
    pub last_track: String,
    #[serde(default)]
    pub offset_in_milliseconds: i64,
    #[serde(default)]
    pub record_version: u64,
}

impl UserRecord {
    pub fn has_track(&self) -> bool {
        !self.last_track.is_empty()
    }
}

/// Field-level change to a [`UserRecord`]; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRecordUpdate {
    pub last_token: Option<String>,
    pub last_track: Option<String>,
    pub offset_in_milliseconds: Option<i64>,
}

impl UserRecordUpdate {
    /// New track started from the beginning.
    pub fn track(token: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            last_token: Some(token.into()),
            last_track: Some(url.into()),
            offset_in_milliseconds: Some(0),
        }
    }

    /// Playback position only.
    pub fn offset(offset_in_milliseconds: i64) -> Self {
        Self {
            offset_in_milliseconds: Some(offset_in_milliseconds),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.last_token.is_none()
            && self.last_track.is_none()
            && self.offset_in_milliseconds.is_none()
    }

    /// Attribute name/value pairs to write.
    pub fn fields(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut fields = serde_json::Map::new();
        if let Some(token) = &self.last_token {
            fields.insert("lastToken".to_string(), token.clone().into());
        }
        if let Some(track) = &self.last_track {
            fields.insert("lastTrack".to_string(), track.clone().into());
        }
        if let Some(offset) = self.offset_in_milliseconds {
            fields.insert("offsetInMilliseconds".to_string(), offset.into());
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_record_defaults() {
        let record: ScheduleRecord =
            serde_json::from_str(r#"{"namespace":"event:mass:holyday:110"}"#).unwrap();
        assert!(record.event_times.is_empty());
        assert_eq!(record.mass_mode, MassMode::Replace);
        assert_eq!(record.event_date(), None);
    }

    #[test]
    fn test_schedule_record_mass_mode() {
        let record: ScheduleRecord = serde_json::from_str(
            r#"{"eventTimes":["9,0"],"massMode":"supplement","eventYear":2026,"eventMonth":12,"eventDay":8}"#,
        )
        .unwrap();
        assert_eq!(record.mass_mode, MassMode::Supplement);
        assert_eq!(record.event_date(), NaiveDate::from_ymd_opt(2026, 12, 8));
    }

    #[test]
    fn test_user_record_from_legacy_item() {
        let record: UserRecord = serde_json::from_str(
            r#"{"namespace":"amzn1.ask.account.X","lastToken":"t1","lastTrack":"https://a/b.mp3","offsetInMilliseconds":1200}"#,
        )
        .unwrap();
        assert_eq!(record.last_token, "t1");
        assert_eq!(record.offset_in_milliseconds, 1200);
        assert_eq!(record.record_version, 0);
    }

    #[test]
    fn test_update_only_names_set_fields() {
        let fields = UserRecordUpdate::offset(4500).fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["offsetInMilliseconds"], 4500);
        assert!(UserRecordUpdate::default().is_empty());
    }
}

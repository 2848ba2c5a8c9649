//! Resolution of spoken day references ("friday's", "tomorrow", "easter")
//! into a concrete day of the parish calendar.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use thiserror::Error;

use crate::holydays::{self, HolyDay};

/// Holy days more than this many days away are spoken with their full date.
const NEAR_DAYS: i64 = 7;

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// A day the parish keeps a schedule for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Day {
    Weekday(Weekday),
    HolyDay(&'static HolyDay),
}

impl Day {
    /// Store identifier: weekday index (Monday = 0) or holy-day id (>= 100).
    pub fn id(&self) -> u32 {
        match self {
            Day::Weekday(weekday) => weekday.num_days_from_monday(),
            Day::HolyDay(holy_day) => holy_day.id,
        }
    }
}

/// Outcome of resolving a spoken day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDay {
    pub day: Day,
    /// Calendar date the request refers to, if one could be placed
    pub date: Option<NaiveDate>,
    /// How the day is named back to the listener ("Today", "Tomorrow, Monday")
    pub display_name: String,
}

impl ResolvedDay {
    pub fn today(today: NaiveDate) -> Self {
        Self {
            day: Day::Weekday(today.weekday()),
            date: Some(today),
            display_name: "Today".to_string(),
        }
    }

    pub fn tomorrow(today: NaiveDate) -> Self {
        let weekday = today.weekday().succ();
        Self {
            day: Day::Weekday(weekday),
            date: Some(today + Duration::days(1)),
            display_name: format!("Tomorrow, {}", weekday_name(weekday)),
        }
    }

    /// How the day is introduced in an answer; holy days are named after
    /// the date ("Thursday May 14, the Ascension of the Lord").
    pub fn label(&self) -> String {
        match self.day {
            Day::HolyDay(holy_day) if self.display_name != holy_day.name => {
                format!("{}, {}", self.display_name, holy_day.spoken_name())
            }
            _ => self.display_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DayError {
    #[error("unrecognized day: {0}")]
    Unrecognized(String),
}

/// Resolve what the listener said into a day, relative to `today` (parish time).
pub fn resolve(spoken: Option<&str>, today: NaiveDate) -> Result<ResolvedDay, DayError> {
    let raw = match spoken.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(ResolvedDay::today(today)),
    };

    // Holy-day names may legitimately end in "s" ("all saints", "christmas").
    if let Some(holy_day) = holydays::find_by_name(raw) {
        return Ok(resolve_holy_day(holy_day, today));
    }

    let stripped = strip_possessive(raw).to_lowercase();

    if stripped == "today" || stripped == weekday_name(today.weekday()).to_lowercase() {
        return Ok(ResolvedDay::today(today));
    }

    if stripped == "tomorrow" {
        return Ok(ResolvedDay::tomorrow(today));
    }

    if let Some(holy_day) = holydays::find_by_name(&stripped) {
        return Ok(resolve_holy_day(holy_day, today));
    }

    match parse_weekday(&stripped) {
        Some(weekday) => {
            let ahead = (7 + weekday.num_days_from_monday() as i64
                - today.weekday().num_days_from_monday() as i64)
                % 7;
            Ok(ResolvedDay {
                day: Day::Weekday(weekday),
                date: Some(today + Duration::days(ahead)),
                display_name: weekday_name(weekday).to_string(),
            })
        }
        None => Err(DayError::Unrecognized(raw.to_string())),
    }
}

fn resolve_holy_day(holy_day: &'static HolyDay, today: NaiveDate) -> ResolvedDay {
    let date = holy_day.date_in(today.year());
    ResolvedDay {
        day: Day::HolyDay(holy_day),
        date,
        display_name: date
            .map(|date| holy_day_display(date, today))
            .unwrap_or_else(|| holy_day.name.to_string()),
    }
}

fn holy_day_display(date: NaiveDate, today: NaiveDate) -> String {
    let away = (date - today).num_days();
    if away == 0 {
        "Today".to_string()
    } else if away.abs() > NEAR_DAYS {
        date.format("%A %B %-d").to_string()
    } else {
        weekday_name(date.weekday()).to_string()
    }
}

/// "Friday's" and "Fridays" both become "Friday".
pub fn strip_possessive(spoken: &str) -> &str {
    let lower = spoken.to_lowercase();
    if lower.ends_with("'s") || lower.ends_with("’s") {
        let cut = spoken
            .char_indices()
            .rev()
            .nth(1)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        &spoken[..cut]
    } else if lower.ends_with('s') {
        &spoken[..spoken.len() - 1]
    } else {
        spoken
    }
}

pub fn parse_weekday(name: &str) -> Option<Weekday> {
    let name = name.trim();
    WEEKDAYS
        .iter()
        .copied()
        .find(|weekday| weekday_name(*weekday).eq_ignore_ascii_case(name))
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Weekday for a store index (Monday = 0).
pub fn weekday_from_index(index: u32) -> Option<Weekday> {
    WEEKDAYS.get(index as usize).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Friday
    fn friday() -> NaiveDate {
        ymd(2026, 10, 16)
    }

    #[test]
    fn test_missing_day_is_today() {
        for spoken in [None, Some(""), Some("   ")] {
            let resolved = resolve(spoken, friday()).unwrap();
            assert_eq!(resolved.display_name, "Today");
            assert_eq!(resolved.day, Day::Weekday(Weekday::Fri));
        }
    }

    #[test]
    fn test_every_weekday_named_on_its_own_day_is_today() {
        let monday = ymd(2026, 10, 12);
        for offset in 0..7 {
            let today = monday + Duration::days(offset);
            let name = weekday_name(today.weekday());
            let named = resolve(Some(name), today).unwrap();
            let implicit = resolve(None, today).unwrap();
            assert_eq!(named.display_name, "Today");
            assert_eq!(named.day, implicit.day);
            assert_eq!(named.day.id(), offset as u32);
        }
    }

    #[test]
    fn test_possessive_and_plural_forms() {
        let monday = ymd(2026, 10, 12);
        let expected = resolve(Some("friday"), monday).unwrap();
        for spoken in ["Friday's", "Fridays", "FRIDAY", "friday"] {
            let resolved = resolve(Some(spoken), monday).unwrap();
            assert_eq!(resolved.day, expected.day);
            assert_eq!(resolved.display_name, "Friday");
            assert_eq!(resolved.date, Some(ymd(2026, 10, 16)));
        }
        assert_eq!(strip_possessive("Friday"), "Friday");
        assert_eq!(strip_possessive("Friday’s"), "Friday");
    }

    #[test]
    fn test_tomorrow_wraps_at_week_end() {
        let saturday = ymd(2026, 10, 17);
        let resolved = resolve(Some("tomorrow"), saturday).unwrap();
        assert_eq!(resolved.day, Day::Weekday(Weekday::Sun));
        assert_eq!(resolved.display_name, "Tomorrow, Sunday");

        let sunday = ymd(2026, 10, 18);
        let resolved = resolve(Some("Tomorrow"), sunday).unwrap();
        assert_eq!(resolved.day.id(), 0);
        assert_eq!(resolved.display_name, "Tomorrow, Monday");
    }

    #[test]
    fn test_holy_day_aliases() {
        let easter = resolve(Some("Easter"), friday()).unwrap();
        let easter_sunday = resolve(Some("easter sunday"), friday()).unwrap();
        assert_eq!(easter.day.id(), 110);
        assert_eq!(easter_sunday.day.id(), 110);
        assert_eq!(easter.date, Some(ymd(2026, 4, 5)));
    }

    #[test]
    fn test_holy_day_names_ending_in_s_survive() {
        assert_eq!(resolve(Some("christmas"), friday()).unwrap().day.id(), 123);
        assert_eq!(resolve(Some("All Saints"), friday()).unwrap().day.id(), 118);
    }

    #[test]
    fn test_holy_day_display_far_away_uses_full_date() {
        let resolved = resolve(Some("christmas"), friday()).unwrap();
        assert_eq!(resolved.display_name, "Friday December 25");
    }

    #[test]
    fn test_holy_day_display_within_a_week_uses_weekday() {
        let today = ymd(2026, 10, 28);
        let resolved = resolve(Some("all saints day"), today).unwrap();
        assert_eq!(resolved.display_name, "Sunday");
    }

    #[test]
    fn test_holy_day_display_today() {
        let today = ymd(2026, 12, 8);
        let resolved = resolve(Some("Immaculate Conception"), today).unwrap();
        assert_eq!(resolved.display_name, "Today");
    }

    #[test]
    fn test_labels() {
        let ascension = resolve(Some("ascension"), ymd(2026, 5, 12)).unwrap();
        assert_eq!(ascension.label(), "Thursday, the Ascension of the Lord");
        let christmas = resolve(Some("christmas"), friday()).unwrap();
        assert_eq!(christmas.label(), "Friday December 25, Christmas");
        assert_eq!(resolve(Some("sunday"), friday()).unwrap().label(), "Sunday");
    }

    #[test]
    fn test_unrecognized_day() {
        let err = resolve(Some("someday"), friday()).unwrap_err();
        assert_eq!(err, DayError::Unrecognized("someday".to_string()));
    }

    #[test]
    fn test_weekday_index_round_trip() {
        for index in 0..7 {
            assert_eq!(
                weekday_from_index(index).map(|w| w.num_days_from_monday()),
                Some(index)
            );
        }
        assert_eq!(weekday_from_index(7), None);
    }
}

//! Upcoming parish calendar events.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::warn;

use crate::models::CalendarRecord;

/// How many events are read out at once.
pub const EVENTS_PER_ANSWER: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub title: String,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
}

impl CalendarEvent {
    fn from_record(record: &CalendarRecord) -> Option<Self> {
        let date = NaiveDate::from_ymd_opt(record.event_year, record.event_month, record.event_day)?;
        let start = parse_clock(&record.event_time_start)?;
        let end = match &record.event_time_end {
            Some(end) => Some(date.and_time(parse_clock(end)?)),
            None => None,
        };
        Some(Self {
            title: record.event_title.clone(),
            start: date.and_time(start),
            end,
        })
    }
}

/// "HH:MM"
fn parse_clock(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

/// The next few events still ahead this month; when none are left, the
/// first ones of next month.
pub fn upcoming(records: &[CalendarRecord], now: NaiveDateTime, count: usize) -> Vec<CalendarEvent> {
    let events: Vec<CalendarEvent> = records
        .iter()
        .filter_map(|record| {
            let event = CalendarEvent::from_record(record);
            if event.is_none() {
                warn!(title = %record.event_title, "Skipping calendar event with bad date");
            }
            event
        })
        .filter(|event| event.start >= now)
        .collect();

    let (year, month) = (now.year(), now.month());
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };

    let in_month = |year: i32, month: u32| {
        let mut found: Vec<CalendarEvent> = events
            .iter()
            .filter(|event| event.start.year() == year && event.start.month() == month)
            .cloned()
            .collect();
        found.sort_by_key(|event| event.start);
        found.truncate(count);
        found
    };

    let this_month = in_month(year, month);
    if this_month.is_empty() {
        in_month(next_year, next_month)
    } else {
        this_month
    }
}

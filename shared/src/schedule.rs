//! Mass schedule lookup and next-mass selection.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use tracing::{info, warn};

use crate::days::{weekday_from_index, Day, ResolvedDay};
use crate::holydays;
use crate::models::{ConfessionRecord, MassMode, ScheduleEntry, ScheduleRecord, DEFAULT_LANGUAGE};
use crate::store::ParishData;
use crate::{Error, Result};

/// Masses known for a requested day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaySchedule {
    /// Sorted by hour, never empty
    Times(Vec<ScheduleEntry>),
    /// Nothing stored for the day
    Empty,
    /// A holy day whose record is stale; we will not guess its masses
    NotYetDefined,
}

impl DaySchedule {
    fn from_entries(entries: Vec<ScheduleEntry>) -> Self {
        if entries.is_empty() {
            DaySchedule::Empty
        } else {
            DaySchedule::Times(entries)
        }
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        match self {
            DaySchedule::Times(entries) => entries,
            _ => &[],
        }
    }
}

/// Parse a stored time: "HH,MM" or "HH,MM,language".
pub fn parse_entry(raw: &str) -> Result<ScheduleEntry> {
    let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
    let (hour, minute, language) = match fields.as_slice() {
        [hour, minute] => (*hour, *minute, DEFAULT_LANGUAGE),
        [hour, minute, language] if !language.is_empty() => (*hour, *minute, *language),
        _ => return Err(Error::InvalidRecord(format!("bad schedule entry {:?}", raw))),
    };

    let hour: u32 = hour
        .parse()
        .map_err(|_| Error::InvalidRecord(format!("bad hour in {:?}", raw)))?;
    let minute: u32 = minute
        .parse()
        .map_err(|_| Error::InvalidRecord(format!("bad minute in {:?}", raw)))?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| Error::InvalidRecord(format!("time out of range in {:?}", raw)))?;

    Ok(ScheduleEntry::new(time, language))
}

/// Parse every stored time, dropping (and logging) malformed ones, sorted by hour.
pub fn parse_entries(raw: &[String]) -> Vec<ScheduleEntry> {
    let mut entries: Vec<ScheduleEntry> = raw
        .iter()
        .filter_map(|raw| match parse_entry(raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Rejecting schedule entry");
                None
            }
        })
        .collect();
    sort_by_hour(&mut entries);
    entries
}

/// Order by hour only. The sort is stable, so masses within the same hour
/// keep the order they were stored in.
pub fn sort_by_hour(entries: &mut [ScheduleEntry]) {
    entries.sort_by_key(|entry| entry.time.hour());
}

/// First mass at or after `now`, or `None` once the last one has started.
pub fn next_after(now: NaiveTime, entries: &[ScheduleEntry]) -> Option<&ScheduleEntry> {
    let last = entries.last()?;
    if now > last.time {
        return None;
    }
    entries.iter().find(|entry| now <= entry.time)
}

/// Holy-day masses added to the weekday's, skipping exact duplicates.
pub fn supplement(regular: &[ScheduleEntry], extra: &[ScheduleEntry]) -> Vec<ScheduleEntry> {
    let mut merged = regular.to_vec();
    for entry in extra {
        if !merged.contains(entry) {
            merged.push(entry.clone());
        }
    }
    sort_by_hour(&mut merged);
    merged
}

/// Regular masses for a weekday.
pub async fn weekday_masses(data: &ParishData, weekday: Weekday) -> Vec<ScheduleEntry> {
    data.daily_schedule(weekday)
        .await
        .map(|record| parse_entries(&record.event_times))
        .unwrap_or_default()
}

/// Masses on a calendar date: the holy day's own masses when one falls on
/// that date and has times stored, otherwise the weekday's.
pub async fn masses_on(data: &ParishData, date: NaiveDate) -> Vec<ScheduleEntry> {
    if let Some(holy_day) = holydays::on_date(date) {
        if let Some(record) = data.holy_day_schedule(holy_day.id).await {
            let own = parse_entries(&record.event_times);
            if !own.is_empty() {
                info!(holy_day = holy_day.id, %date, "Using holy day masses");
                return match record.mass_mode {
                    MassMode::Supplement => {
                        supplement(&weekday_masses(data, date.weekday()).await, &own)
                    }
                    MassMode::Replace => own,
                };
            }
        }
    }
    weekday_masses(data, date.weekday()).await
}

/// Masses for a resolved day; `today` is the parish-local date.
pub async fn mass_times(data: &ParishData, resolved: &ResolvedDay, today: NaiveDate) -> DaySchedule {
    match resolved.day {
        Day::Weekday(weekday) => {
            let entries = match resolved.date {
                Some(date) => masses_on(data, date).await,
                None => weekday_masses(data, weekday).await,
            };
            DaySchedule::from_entries(entries)
        }
        Day::HolyDay(holy_day) => {
            let Some(record) = data.holy_day_schedule(holy_day.id).await else {
                info!(holy_day = holy_day.id, "No holy day record");
                return DaySchedule::Empty;
            };
            holy_day_masses(data, &record, resolved.date, today).await
        }
    }
}

async fn holy_day_masses(
    data: &ParishData,
    record: &ScheduleRecord,
    computed_date: Option<NaiveDate>,
    today: NaiveDate,
) -> DaySchedule {
    let own = parse_entries(&record.event_times);
    let date = record.event_date().or(computed_date);

    if !own.is_empty() {
        return match (record.mass_mode, date) {
            (MassMode::Supplement, Some(date)) => {
                let regular = weekday_masses(data, date.weekday()).await;
                DaySchedule::from_entries(supplement(&regular, &own))
            }
            _ => DaySchedule::Times(own),
        };
    }

    // No times of its own: fall back to the weekday it lands on, unless the
    // record's date has already gone by.
    match date {
        Some(date) if date >= today => {
            DaySchedule::from_entries(weekday_masses(data, date.weekday()).await)
        }
        Some(date) => {
            info!(%date, "Holy day date already passed");
            DaySchedule::NotYetDefined
        }
        None => DaySchedule::NotYetDefined,
    }
}

/// Confession availability for one weekday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfessionDay {
    pub day_name: String,
    pub times: Vec<ScheduleEntry>,
}

/// Confession days ordered from `today` onward; days already past this week
/// come after the rest.
pub fn order_confessions(records: Vec<ConfessionRecord>, today: Weekday) -> Vec<ConfessionDay> {
    let today_index = today.num_days_from_monday();
    let mut days: Vec<(u32, ConfessionDay)> = records
        .into_iter()
        .filter(|record| weekday_from_index(record.day_enum).is_some())
        .map(|record| {
            let order = if record.day_enum < today_index {
                record.day_enum + 7
            } else {
                record.day_enum
            };
            let day = ConfessionDay {
                day_name: record.day_name,
                times: parse_entries(&record.event_times),
            };
            (order, day)
        })
        .filter(|(_, day)| !day.times.is_empty())
        .collect();
    days.sort_by_key(|(order, _)| *order);
    days.into_iter().map(|(_, day)| day).collect()
}

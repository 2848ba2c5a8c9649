//! Spoken and card text for every answer the skill gives.

use chrono::{NaiveDate, NaiveTime, Timelike};

use crate::calendar::CalendarEvent;
use crate::models::{ScheduleEntry, TalkRecord};
use crate::schedule::{ConfessionDay, DaySchedule};

pub const DEFAULT_REPROMPT: &str = "Try asking: when is the next Mass.";
pub const FOLLOW_UP_REPROMPT: &str = "What else can I help you with?";

/// Text of one answer: what is spoken and what is shown on the card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpokenResponse {
    pub speech: String,
    pub reprompt: Option<String>,
    pub title: String,
    pub text: String,
}

impl SpokenResponse {
    pub fn new(speech: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speech: speech.into(),
            reprompt: None,
            title: title.into(),
            text: text.into(),
        }
    }

    pub fn with_reprompt(mut self, reprompt: impl Into<String>) -> Self {
        self.reprompt = Some(reprompt.into());
        self
    }
}

/// Hour on a 12-hour clock plus its "am"/"pm" suffix. Midnight is 12 am.
pub fn twelve_hour(time: NaiveTime) -> (u32, &'static str) {
    let (pm, hour) = time.hour12();
    (hour, if pm { "pm" } else { "am" })
}

/// "7:30 am", "12:00 pm", "11:00 am in spanish".
pub fn format_time(entry: &ScheduleEntry) -> String {
    let (hour, suffix) = twelve_hour(entry.time);
    let mut formatted = format!("{}:{:02} {}", hour, entry.time.minute(), suffix);
    if !entry.is_english() {
        formatted.push_str(" in ");
        formatted.push_str(&entry.language);
    }
    formatted
}

pub fn format_list(entries: &[ScheduleEntry]) -> String {
    entries.iter().map(format_time).collect::<Vec<_>>().join(", ")
}

/// Answer to "when is mass on <day>".
pub fn mass_times(display_name: &str, schedule: &DaySchedule) -> SpokenResponse {
    let title = format!("Mass Times: {}", display_name);
    match schedule {
        DaySchedule::Times(entries) => {
            let list = format_list(entries);
            SpokenResponse::new(
                format!("{}, the mass times are {}.", display_name, list),
                title,
                format!("{} mass times:\n{}", display_name, list),
            )
        }
        DaySchedule::Empty => SpokenResponse::new(
            format!(
                "I'm sorry, I don't have any mass times for {}. Please try again later.",
                display_name
            ),
            title,
            format!("No mass times found for {}.", display_name),
        ),
        DaySchedule::NotYetDefined => SpokenResponse::new(
            format!(
                "The mass times for {} have not been announced yet. Please try again later.",
                display_name
            ),
            title,
            format!("Mass times for {} not yet announced.", display_name),
        ),
    }
    .with_reprompt(DEFAULT_REPROMPT)
}

/// Answer to "when is the next mass" while masses remain today.
pub fn next_mass(entry: &ScheduleEntry) -> SpokenResponse {
    let speech = format!("The next mass today will be at {}.", format_time(entry));
    SpokenResponse::new(speech.clone(), "Next Mass", speech).with_reprompt("What else can I do for you?")
}

/// Answer to "when is the next mass" once today's are over; `tomorrow` is
/// the answer for tomorrow's schedule.
pub fn no_more_masses(tomorrow: SpokenResponse) -> SpokenResponse {
    let speech = format!("There are no more masses today. {}", tomorrow.speech);
    SpokenResponse {
        speech: speech.clone(),
        reprompt: tomorrow.reprompt,
        title: "Next Mass".to_string(),
        text: speech,
    }
}

pub fn unrecognized_day(spoken: &str) -> SpokenResponse {
    SpokenResponse::new(
        format!(
            "Sorry, I didn't understand which day you meant by {}. Which day would you like mass times for?",
            spoken
        ),
        "Mass Times",
        format!("Unknown day: {}", spoken),
    )
    .with_reprompt("Which day would you like mass times for?")
}

pub fn confession(days: &[ConfessionDay]) -> SpokenResponse {
    if days.is_empty() {
        return SpokenResponse::new(
            "I'm sorry, I don't have any confession times right now. Please try again later.",
            "Confession",
            "No confession times found.",
        )
        .with_reprompt(FOLLOW_UP_REPROMPT);
    }

    let spoken: Vec<String> = days
        .iter()
        .map(|day| format!("{}, {}", day.day_name, format_list(&day.times)))
        .collect();
    let card: Vec<String> = days
        .iter()
        .map(|day| format!("{}: {}", day.day_name, format_list(&day.times)))
        .collect();

    SpokenResponse::new(
        format!(
            "The sacrament of reconciliation will be available {}.",
            spoken.join("; ")
        ),
        "Confession",
        card.join("\n"),
    )
    .with_reprompt(FOLLOW_UP_REPROMPT)
}

pub fn calendar(events: &[CalendarEvent]) -> SpokenResponse {
    if events.is_empty() {
        return SpokenResponse::new(
            "There are no upcoming events on the parish calendar.",
            "Upcoming Events",
            "No upcoming events.",
        )
        .with_reprompt(FOLLOW_UP_REPROMPT);
    }

    let phrase = if events.len() == 1 {
        "event is".to_string()
    } else {
        format!("{} events are", events.len())
    };

    let described: Vec<String> = events
        .iter()
        .map(|event| {
            let date = event.start.format("%A, %B %-d");
            let start = format_time(&ScheduleEntry::english(event.start.time()));
            match event.end {
                Some(end) => {
                    let end = format_time(&ScheduleEntry::english(end.time()));
                    format!("{}, on {}, from {} to {}.", event.title, date, start, end)
                }
                None => format!("{}, on {}, at {}.", event.title, date, start),
            }
        })
        .collect();

    let speech = format!("The next {}: {}", phrase, described.join(" "));
    SpokenResponse::new(speech.clone(), "Upcoming Events", speech).with_reprompt(FOLLOW_UP_REPROMPT)
}

/// Digits are read one by one; the card shows "+1.949.555.1234".
pub fn phone(parish_name: &str, number: Option<&str>) -> SpokenResponse {
    let title = "Parish Office Phone Number";
    let digits: Vec<char> = number
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();

    if digits.is_empty() {
        return SpokenResponse::new(
            format!(
                "I'm sorry, I don't have the {} Parish Office phone number right now. Please try again later.",
                parish_name
            ),
            title,
            "Phone number unavailable.",
        )
        .with_reprompt(DEFAULT_REPROMPT);
    }

    let spoken: Vec<String> = digits.iter().map(char::to_string).collect();
    let card = if digits.len() == 10 {
        let digits: String = digits.iter().collect();
        format!("+1.{}.{}.{}", &digits[..3], &digits[3..6], &digits[6..])
    } else {
        digits.iter().collect()
    };

    SpokenResponse::new(
        format!(
            "The phone number for the {} Parish Office is, {}",
            parish_name,
            spoken.join(", ")
        ),
        title,
        card,
    )
    .with_reprompt(DEFAULT_REPROMPT)
}

pub fn talk(parish_name: &str, talk: &TalkRecord) -> SpokenResponse {
    let speech = match talk.date() {
        Some(date) => format!("Okay. Here is a talk from {}.", date.format("%A, %B %-d, %Y")),
        None => "Okay. Here is the latest talk.".to_string(),
    };
    SpokenResponse::new(speech, format!("{}: Latest Talk", parish_name), talk.event_title.clone())
}

pub fn no_talk(parish_name: &str) -> SpokenResponse {
    SpokenResponse::new(
        "I'm sorry, there are no talks available right now. Please try again later.",
        format!("{}: Latest Talk", parish_name),
        "No talks available.",
    )
}

/// Most recent talk by date; undated talks sort first.
pub fn latest_talk(talks: &[TalkRecord]) -> Option<&TalkRecord> {
    talks.iter().max_by_key(|talk| talk.date().unwrap_or(NaiveDate::MIN))
}

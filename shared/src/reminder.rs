//! Next-mass reminders.
//!
//! [`decide`] holds the whole confirmation turn as a pure function of the
//! listener's answer, their consent, the clock and today's next mass. Only a
//! [`ReminderDecision::Schedule`] leads to a call on a [`ReminderService`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::format::{twelve_hour, SpokenResponse};
use crate::{Error, Result};

/// Permission scope the listener must grant for reminders.
pub const REMINDER_PERMISSION: &str = "alexa::alerts:reminders:skill:readwrite";

pub const REMINDER_TEXT: &str = "It is time to leave for mass.";

/// Answers to "would you like a reminder" that mean no.
const NEGATIVE_RESPONSES: [&str; 5] = ["nah", "nope", "no thank you", "no thanks", "no"];

pub fn is_negative(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    NEGATIVE_RESPONSES.contains(&answer.as_str())
}

/// Where a confirmation turn ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderDecision {
    Declined,
    PermissionRequired,
    NoMassToday,
    TooLate { minutes_left: i64 },
    Schedule { remind_at: DateTime<Tz>, mass_at: DateTime<Tz> },
}

/// Decide what to do with a reminder request.
///
/// `answer` is the filled `DESIRES_REMINDER` slot, absent when the listener
/// asked for a reminder directly. `now` must already be in parish time.
pub fn decide(
    answer: Option<&str>,
    has_consent: bool,
    now: DateTime<Tz>,
    next_mass: Option<NaiveTime>,
    lead: Duration,
) -> ReminderDecision {
    if answer.map(is_negative).unwrap_or(false) {
        return ReminderDecision::Declined;
    }
    if !has_consent {
        return ReminderDecision::PermissionRequired;
    }
    // Place the mass on today's local calendar; a wall time skipped by a
    // DST change has no instant and counts as no mass.
    let Some(mass_at) = next_mass.and_then(|mass_time| {
        now.timezone()
            .from_local_datetime(&now.date_naive().and_time(mass_time))
            .earliest()
    }) else {
        return ReminderDecision::NoMassToday;
    };

    let remind_at = mass_at - lead;
    if remind_at < now {
        return ReminderDecision::TooLate {
            minutes_left: (mass_at - now).num_minutes().max(0),
        };
    }

    ReminderDecision::Schedule { remind_at, mass_at }
}

/// Text for every outcome except [`ReminderDecision::PermissionRequired`],
/// whose consent card the caller builds.
pub fn response(decision: &ReminderDecision, parish_name: &str) -> SpokenResponse {
    let title = format!("{} - Mass Reminder", parish_name);
    match decision {
        ReminderDecision::Declined => SpokenResponse::new("Okay.", "Next Mass", "No reminder requested."),
        ReminderDecision::PermissionRequired => SpokenResponse::new(
            format!(
                "Please give {} permissions to set reminders using your Alexa app.",
                parish_name
            ),
            title,
            "Reminder permission required.",
        ),
        ReminderDecision::NoMassToday => SpokenResponse::new(
            "Sorry, but it looks like there are no more masses today.",
            title,
            "No more masses today.\nTry again tomorrow.",
        ),
        ReminderDecision::TooLate { minutes_left } => SpokenResponse::new(
            format!(
                "It looks like it's too late for a reminder. You only have {} minutes left until Mass.",
                minutes_left
            ),
            title,
            "Too late for a reminder.",
        ),
        ReminderDecision::Schedule { remind_at, .. } => {
            let (hour, suffix) = twelve_hour(remind_at.time());
            SpokenResponse::new(
                format!(
                    "I will remind you at {}:{}{} to leave for mass.",
                    hour,
                    remind_at.format("%M"),
                    suffix
                ),
                parish_name,
                "Reminder set for Mass.",
            )
        }
    }
}

/// Body of a Reminders API create call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRequest {
    pub request_time: String,
    pub trigger: Trigger,
    pub alert_info: AlertInfo,
    pub push_notification: PushNotification,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    #[serde(rename = "type")]
    pub trigger_type: String,
    pub scheduled_time: String,
    pub time_zone_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertInfo {
    pub spoken_info: SpokenInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpokenInfo {
    pub content: Vec<SpokenText>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpokenText {
    pub locale: String,
    pub text: String,
    pub ssml: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushNotification {
    pub status: String,
}

impl ReminderRequest {
    /// Absolute reminder at `remind_at`, in the zone `remind_at` carries.
    pub fn at(remind_at: DateTime<Tz>, now: DateTime<Tz>, locale: &str) -> Self {
        Self {
            request_time: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
            trigger: Trigger {
                trigger_type: "SCHEDULED_ABSOLUTE".to_string(),
                scheduled_time: remind_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
                time_zone_id: remind_at.timezone().name().to_string(),
            },
            alert_info: AlertInfo {
                spoken_info: SpokenInfo {
                    content: vec![SpokenText {
                        locale: locale.to_string(),
                        text: REMINDER_TEXT.to_string(),
                        ssml: format!("<speak>{}</speak>", REMINDER_TEXT),
                    }],
                },
            },
            push_notification: PushNotification {
                status: "ENABLED".to_string(),
            },
        }
    }
}

/// Per-request credentials for Alexa service APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiAccess {
    pub endpoint: String,
    pub token: String,
}

#[async_trait]
pub trait ReminderService: Send + Sync {
    /// Create a reminder. Failures are returned as-is; nothing is retried.
    async fn create(&self, access: &ApiAccess, request: &ReminderRequest) -> Result<()>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReminderCreated {
    alert_token: Option<String>,
}

/// Reminders API client.
#[derive(Clone, Default)]
pub struct AlexaReminderClient {
    http_client: reqwest::Client,
}

impl AlexaReminderClient {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl ReminderService for AlexaReminderClient {
    async fn create(&self, access: &ApiAccess, request: &ReminderRequest) -> Result<()> {
        let url = format!("{}/v1/alerts/reminders", access.endpoint.trim_end_matches('/'));
        info!(scheduled_time = %request.trigger.scheduled_time, "Creating reminder");

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", access.token))
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Reminder(format!("Reminder request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %error_text, "Reminders API rejected request");
            return Err(Error::Reminder(format!("Reminders API error {}: {}", status, error_text)));
        }

        let created: ReminderCreated = response
            .json()
            .await
            .map_err(|e| Error::Reminder(format!("Failed to parse reminder response: {}", e)))?;
        info!(alert_token = ?created.alert_token, "Reminder created");
        Ok(())
    }
}

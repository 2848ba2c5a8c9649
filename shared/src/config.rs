//! Configuration management for the skill Lambda.

use chrono::Duration;
use chrono_tz::Tz;
use std::env;

use crate::{Error, Result};

const DEFAULT_TABLE: &str = "StKillian";
const DEFAULT_TIMEZONE: &str = "America/Los_Angeles";
const DEFAULT_LEAD_MINUTES: i64 = 30;
const DEFAULT_HOMILY_URL: &str =
    "https://st-killian-resources.s3.amazonaws.com/homilies/killianGeneric_mixdown.mp3";
const DEFAULT_HOMILY_TOKEN: &str = "kilianGeneric_mixdown";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// DynamoDB table holding schedules, parish info and user records
    pub table_name: String,
    /// AWS region
    pub aws_region: String,
    /// The parish's civil time zone; all schedule comparisons happen here
    pub timezone: Tz,
    /// How long before mass a reminder fires
    pub reminder_lead: Duration,
    /// Expected Alexa application id (unchecked when absent)
    pub skill_id: Option<String>,
    /// Spoken parish name
    pub parish_name: String,
    /// Stream URL for the latest homily
    pub homily_url: String,
    /// AudioPlayer token for the latest homily
    pub homily_token: String,
    /// Locale used for reminder speech
    pub reminder_locale: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE.to_string(),
            aws_region: "us-east-1".to_string(),
            timezone: chrono_tz::America::Los_Angeles,
            reminder_lead: Duration::minutes(DEFAULT_LEAD_MINUTES),
            skill_id: None,
            parish_name: "Saint Kilian".to_string(),
            homily_url: DEFAULT_HOMILY_URL.to_string(),
            homily_token: DEFAULT_HOMILY_TOKEN.to_string(),
            reminder_locale: "en-US".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let timezone_name =
            lookup("PARISH_TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone: Tz = timezone_name
            .parse()
            .map_err(|e| Error::Config(format!("Invalid PARISH_TIMEZONE {}: {}", timezone_name, e)))?;

        let reminder_lead = match lookup("REMINDER_LEAD_MINUTES") {
            Some(raw) => {
                let minutes: i64 = raw.trim().parse().map_err(|_| {
                    Error::Config(format!("Invalid REMINDER_LEAD_MINUTES: {}", raw))
                })?;
                if minutes < 0 {
                    return Err(Error::Config(
                        "REMINDER_LEAD_MINUTES must not be negative".to_string(),
                    ));
                }
                Duration::minutes(minutes)
            }
            None => defaults.reminder_lead,
        };

        Ok(Self {
            table_name: lookup("TABLE_NAME").unwrap_or(defaults.table_name),
            aws_region: lookup("AWS_REGION").unwrap_or(defaults.aws_region),
            timezone,
            reminder_lead,
            skill_id: lookup("SKILL_ID").filter(|id| !id.is_empty()),
            parish_name: lookup("PARISH_NAME").unwrap_or(defaults.parish_name),
            homily_url: lookup("HOMILY_URL").unwrap_or(defaults.homily_url),
            homily_token: lookup("HOMILY_TOKEN").unwrap_or(defaults.homily_token),
            reminder_locale: lookup("REMINDER_LOCALE").unwrap_or(defaults.reminder_locale),
        })
    }
}

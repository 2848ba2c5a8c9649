//! Request dispatch.

mod audio;
mod info;
mod mass;
mod notify;

use chrono::{DateTime, Utc};
use shared::{Error, Result, SpokenResponse};
use tracing::{info, warn};

use crate::envelope::{Request, RequestEnvelope, ResponseBuilder, ResponseEnvelope};
use crate::session::SkillSession;
use crate::AppState;

const ERROR_SPEECH: &str = "Sorry, I've encountered an error in my code. \
     If this problem persists, please inform the Saint Kilian parish office.";
const ERROR_REPROMPT: &str = "I didn't catch that. What can I help you with?";

/// Handle one request. `now` is the invocation time in UTC; handlers convert
/// it into parish time before comparing against any schedule.
pub async fn handle(state: &AppState, envelope: &RequestEnvelope, now: DateTime<Utc>) -> Result<ResponseEnvelope> {
    let session = SkillSession::new(envelope);
    check_application(state, &session)?;

    let now = now.with_timezone(&state.config.timezone);

    match session.request() {
        Request::LaunchRequest {} => Ok(info::launch(state)),
        Request::IntentRequest(request) => {
            let name = request.intent.name.as_str();
            info!(intent = name, dialog_state = ?request.dialog_state, "Dispatching intent");
            match name {
                "MassTimeIntent" => Ok(mass::mass_time(state, &session, now).await),
                "NextMassIntent" => Ok(mass::next_mass(state, now).await),
                "NotifyNextMassIntent" => notify::notify_next_mass(state, &session, now).await,
                "ConfessionIntent" => Ok(info::confession(state, now).await),
                "CalendarEventIntent" => Ok(info::calendar(state, now).await),
                "ParishPhoneIntent" => Ok(info::phone(state).await),
                "LatestHomilyIntent" => Ok(audio::latest_homily(state, &session).await),
                "LatestTalkIntent" => Ok(audio::latest_talk(state, &session).await),
                "AMAZON.HelpIntent" => Ok(info::help(state)),
                "AMAZON.CancelIntent" | "AMAZON.StopIntent" | "AMAZON.PauseIntent" => {
                    Ok(audio::stop(state, &session).await)
                }
                "AMAZON.ResumeIntent" | "AudioPlayer.ResumeIntent" => Ok(audio::resume(state, &session).await),
                "AMAZON.StartOverIntent" => Ok(audio::start_over(state, &session).await),
                "AMAZON.NextIntent"
                | "AMAZON.PreviousIntent"
                | "AudioPlayer.PreviousIntent"
                | "AMAZON.LoopOnIntent"
                | "AMAZON.LoopOffIntent"
                | "AMAZON.ShuffleOnIntent"
                | "AMAZON.ShuffleOffIntent"
                | "AMAZON.RepeatIntent" => Ok(audio::unsupported()),
                "AMAZON.FallbackIntent" => Ok(info::fallback()),
                other => {
                    warn!(intent = other, "Unhandled intent");
                    Ok(info::fallback())
                }
            }
        }
        Request::SessionEndedRequest(ended) => {
            info!(reason = ?ended.reason, "Session ended");
            Ok(ResponseEnvelope::empty())
        }
        Request::PlaybackStopped(event) => Ok(audio::playback_stopped(state, &session, event).await),
        Request::PlaybackStarted(event)
        | Request::PlaybackFinished(event)
        | Request::PlaybackNearlyFinished(event)
        | Request::PlaybackFailed(event) => {
            info!(
                request = session.request().kind(),
                token = ?event.token,
                offset = event.offset_in_milliseconds,
                "Playback event"
            );
            Ok(ResponseEnvelope::empty())
        }
        Request::Unsupported => {
            warn!("Unsupported request type");
            Ok(info::fallback())
        }
    }
}

/// Reject requests from any skill other than the configured one.
fn check_application(state: &AppState, session: &SkillSession<'_>) -> Result<()> {
    let Some(expected) = state.config.skill_id.as_deref() else {
        return Ok(());
    };
    match session.application_id() {
        Some(id) if id == expected => Ok(()),
        other => Err(Error::Validation(format!(
            "Invalid application id: {}",
            other.unwrap_or("<none>")
        ))),
    }
}

/// The answer given whenever a handler fails.
pub fn error_response() -> ResponseEnvelope {
    ResponseBuilder::new()
        .speak(ERROR_SPEECH)
        .ask(ERROR_REPROMPT)
        .end_session(true)
        .build()
}

/// Speech, reprompt and a standard card from a formatted answer.
fn respond(response: SpokenResponse) -> ResponseBuilder {
    let mut builder = ResponseBuilder::new().speak(response.speech);
    if let Some(reprompt) = response.reprompt {
        builder = builder.ask(reprompt);
    }
    builder.standard_card(response.title, response.text)
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use chrono_tz::America::Los_Angeles;
    use serde_json::{json, Value};
    use shared::reminder::{ApiAccess, ReminderRequest, ReminderService};
    use shared::store::{keys, MemoryStore};
    use shared::{Config, Error, Result};
    use std::sync::{Arc, Mutex};

    use crate::envelope::{RequestEnvelope, ResponseEnvelope};
    use crate::AppState;

    /// Records every reminder it is asked to create.
    #[derive(Default)]
    pub struct RecordingReminders {
        pub created: Mutex<Vec<ReminderRequest>>,
        pub fail: bool,
    }

    #[async_trait]
    impl ReminderService for RecordingReminders {
        async fn create(&self, _access: &ApiAccess, request: &ReminderRequest) -> Result<()> {
            if self.fail {
                return Err(Error::Reminder("service unavailable".to_string()));
            }
            self.created.lock().unwrap().push(request.clone());
            Ok(())
        }
    }

    pub struct Fixture {
        pub state: AppState,
        pub store: Arc<MemoryStore>,
        pub reminders: Arc<RecordingReminders>,
    }

    pub async fn fixture() -> Fixture {
        fixture_with(RecordingReminders::default()).await
    }

    pub async fn fixture_with(reminders: RecordingReminders) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        store
            .put(&keys::daily_mass(chrono::Weekday::Fri), json!({"eventTimes": ["8,0", "17,0"]}))
            .await;
        store
            .put(&keys::daily_mass(chrono::Weekday::Sat), json!({"eventTimes": ["8,0", "17,0,spanish"]}))
            .await;
        store
            .put(&keys::daily_mass(chrono::Weekday::Sun), json!({"eventTimes": ["7,30", "9,0", "11,0"]}))
            .await;
        store
            .put(keys::OFFICE_PHONE, json!({"phoneNumber": "9495551234"}))
            .await;

        let reminders = Arc::new(reminders);
        let state = AppState::from_parts(Config::default(), store.clone(), reminders.clone());
        Fixture {
            state,
            store,
            reminders,
        }
    }

    /// Friday 2026-10-16 at the given parish-local time, as UTC.
    pub fn friday_at(hour: u32, minute: u32) -> DateTime<Utc> {
        Los_Angeles
            .with_ymd_and_hms(2026, 10, 16, hour, minute, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    pub fn intent(name: &str, slots: Value, consent: bool) -> RequestEnvelope {
        let mut user = json!({"userId": "amzn1.ask.account.TEST"});
        if consent {
            user["permissions"] = json!({"consentToken": "consent"});
        }
        serde_json::from_value(json!({
            "session": {"application": {"applicationId": "amzn1.ask.skill.TEST"}, "user": user.clone()},
            "context": {"System": {
                "application": {"applicationId": "amzn1.ask.skill.TEST"},
                "user": user,
                "apiEndpoint": "https://api.amazonalexa.com",
                "apiAccessToken": "access"
            }},
            "request": {"type": "IntentRequest", "dialogState": "STARTED", "intent": {"name": name, "slots": slots}}
        }))
        .unwrap()
    }

    pub fn speech(response: &ResponseEnvelope) -> String {
        response
            .response
            .output_speech
            .as_ref()
            .map(|speech| speech.text().to_string())
            .unwrap_or_default()
    }
}

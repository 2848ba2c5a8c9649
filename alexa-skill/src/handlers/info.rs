use chrono::{DateTime, Datelike};
use chrono_tz::Tz;
use shared::calendar::{upcoming, EVENTS_PER_ANSWER};
use shared::format::{self, DEFAULT_REPROMPT};
use shared::schedule;
use tracing::info;

use super::{respond, ERROR_REPROMPT};
use crate::envelope::{ResponseBuilder, ResponseEnvelope};
use crate::AppState;

const WELCOME_AUDIO: &str = "https://st-killian-resources.s3.amazonaws.com/killianWelcome01_ssml.mp3";
const HELP_REQUESTS: &str = "What time is mass? When is mass on Sunday? \
     When is the next mass? Remind me to go to mass. \
     When is confession? What is the parish office phone number? \
     Now, how may I help you?";

pub fn launch(state: &AppState) -> ResponseEnvelope {
    let speech = format!(
        "<speak><audio src=\"{}\"></audio> How may I be of service?</speak>",
        WELCOME_AUDIO
    );
    ResponseBuilder::new()
        .speak(speech)
        .ask(DEFAULT_REPROMPT)
        .standard_card(
            format!("{} Parish", state.config.parish_name),
            "Try asking 'When is the next mass?'",
        )
        .end_session(false)
        .build()
}

pub fn help(state: &AppState) -> ResponseEnvelope {
    let speech = format!(
        "{} can help you with the following requests. {}",
        state.config.parish_name, HELP_REQUESTS
    );
    ResponseBuilder::new()
        .speak(speech)
        .ask(ERROR_REPROMPT)
        .end_session(false)
        .build()
}

pub fn fallback() -> ResponseEnvelope {
    ResponseBuilder::new()
        .speak("Sorry, I'm not sure how to help you with that. You can try asking when is the next Mass.")
        .ask(ERROR_REPROMPT)
        .build()
}

pub async fn confession(state: &AppState, now: DateTime<Tz>) -> ResponseEnvelope {
    let records = state.data.confessions().await;
    let days = schedule::order_confessions(records, now.weekday());
    info!(days = days.len(), "Confession lookup");
    respond(format::confession(&days)).end_session(true).build()
}

pub async fn calendar(state: &AppState, now: DateTime<Tz>) -> ResponseEnvelope {
    let records = state.data.calendar_events().await;
    let events = upcoming(&records, now.naive_local(), EVENTS_PER_ANSWER);
    info!(events = events.len(), "Calendar lookup");
    respond(format::calendar(&events)).end_session(true).build()
}

pub async fn phone(state: &AppState) -> ResponseEnvelope {
    let number = state.data.office_phone().await;
    respond(format::phone(&state.config.parish_name, number.as_deref()))
        .end_session(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::super::handle;
    use super::super::testing::*;
    use crate::envelope::{Card, OutputSpeech, RequestEnvelope};
    use serde_json::json;

    #[tokio::test]
    async fn test_launch_speaks_ssml_welcome() {
        let fx = fixture().await;
        let envelope: RequestEnvelope = serde_json::from_value(json!({
            "session": {"application": {"applicationId": "amzn1.ask.skill.TEST"}},
            "request": {"type": "LaunchRequest", "requestId": "r1"}
        }))
        .unwrap();
        let response = handle(&fx.state, &envelope, friday_at(9, 0)).await.unwrap();
        assert!(matches!(
            response.response.output_speech,
            Some(OutputSpeech::Ssml { ref ssml }) if ssml.contains("<audio src=")
        ));
        assert_eq!(response.response.should_end_session, Some(false));
    }

    #[tokio::test]
    async fn test_phone() {
        let fx = fixture().await;
        let response = handle(&fx.state, &intent("ParishPhoneIntent", json!({}), false), friday_at(9, 0))
            .await
            .unwrap();
        assert!(speech(&response).ends_with("9, 4, 9, 5, 5, 5, 1, 2, 3, 4"));
        assert!(matches!(
            response.response.card,
            Some(Card::Standard { ref text, .. }) if text == "+1.949.555.1234"
        ));
    }

    #[tokio::test]
    async fn test_confession_starts_from_today() {
        let fx = fixture().await;
        fx.store
            .put(
                "event:confession:0",
                json!({"eventCategory": "confession", "dayEnum": 0, "dayName": "Monday", "eventTimes": ["19,0"]}),
            )
            .await;
        fx.store
            .put(
                "event:confession:5",
                json!({"eventCategory": "confession", "dayEnum": 5, "dayName": "Saturday", "eventTimes": ["15,30"]}),
            )
            .await;
        let response = handle(&fx.state, &intent("ConfessionIntent", json!({}), false), friday_at(9, 0))
            .await
            .unwrap();
        assert_eq!(
            speech(&response),
            "The sacrament of reconciliation will be available Saturday, 3:30 pm; Monday, 7:00 pm."
        );
    }

    #[tokio::test]
    async fn test_calendar_reads_upcoming_events() {
        let fx = fixture().await;
        fx.store
            .put(
                "event:calendar:oktoberfest",
                json!({
                    "eventCategory": "calendar",
                    "eventTitle": "Oktoberfest",
                    "eventYear": 2026, "eventMonth": 10, "eventDay": 17,
                    "eventTimeStart": "17:00", "eventTimeEnd": "22:00"
                }),
            )
            .await;
        let response = handle(&fx.state, &intent("CalendarEventIntent", json!({}), false), friday_at(9, 0))
            .await
            .unwrap();
        assert_eq!(
            speech(&response),
            "The next event is: Oktoberfest, on Saturday, October 17, from 5:00 pm to 10:00 pm."
        );
    }

    #[tokio::test]
    async fn test_help_keeps_session_open() {
        let fx = fixture().await;
        let response = handle(&fx.state, &intent("AMAZON.HelpIntent", json!({}), false), friday_at(9, 0))
            .await
            .unwrap();
        assert!(speech(&response).starts_with("Saint Kilian can help you"));
        assert_eq!(response.response.should_end_session, Some(false));
    }
}

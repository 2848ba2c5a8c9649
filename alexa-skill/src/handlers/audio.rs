//! Homily and talk playback through the AudioPlayer interface.

use shared::format;
use shared::models::{UserRecord, UserRecordUpdate};
use tracing::{info, warn};

use crate::envelope::{Directive, PlaybackEvent, ResponseBuilder, ResponseEnvelope};
use crate::session::SkillSession;
use crate::AppState;

const HOMILY_TITLE: &str = "Latest Homily";
const TALK_TITLE: &str = "Latest Talk";

/// Persist playback state. Write failures are logged, not returned.
async fn remember(state: &AppState, session: &SkillSession<'_>, update: UserRecordUpdate) {
    let Some(user_id) = session.user_id() else {
        warn!("No user id on request, playback state not saved");
        return;
    };
    if let Err(e) = state.data.save_user(user_id, &update).await {
        warn!(error = %e, "Failed to save playback state");
    }
}

async fn last_played(state: &AppState, session: &SkillSession<'_>) -> UserRecord {
    match session.user_id() {
        Some(user_id) => state.data.user(user_id).await,
        None => UserRecord::default(),
    }
}

pub async fn latest_homily(state: &AppState, session: &SkillSession<'_>) -> ResponseEnvelope {
    let config = &state.config;
    info!(token = %config.homily_token, "Playing latest homily");
    remember(
        state,
        session,
        UserRecordUpdate::track(&config.homily_token, &config.homily_url),
    )
    .await;

    let title = format!("{}: {}", config.parish_name, HOMILY_TITLE);
    ResponseBuilder::new()
        .speak("Okay. Here is the latest homily.")
        .standard_card(title, HOMILY_TITLE)
        .directive(Directive::play(
            &config.homily_token,
            &config.homily_url,
            0,
            HOMILY_TITLE,
            &config.parish_name,
        ))
        .session_attribute("lastTrack", config.homily_url.clone())
        .session_attribute("lastToken", config.homily_token.clone())
        .end_session(true)
        .build()
}

pub async fn latest_talk(state: &AppState, session: &SkillSession<'_>) -> ResponseEnvelope {
    let talks = state.data.talks().await;
    let Some(talk) = format::latest_talk(&talks) else {
        info!("No talks found");
        let response = format::no_talk(&state.config.parish_name);
        return ResponseBuilder::new()
            .speak(response.speech)
            .standard_card(response.title, response.text)
            .end_session(true)
            .build();
    };

    info!(token = %talk.namespace, "Playing latest talk");
    remember(state, session, UserRecordUpdate::track(&talk.namespace, &talk.url)).await;

    let response = format::talk(&state.config.parish_name, talk);
    ResponseBuilder::new()
        .speak(response.speech)
        .standard_card(response.title, response.text.clone())
        .directive(Directive::play(&talk.namespace, &talk.url, 0, TALK_TITLE, &response.text))
        .session_attribute("lastTrack", talk.url.clone())
        .session_attribute("lastToken", talk.namespace.clone())
        .end_session(true)
        .build()
}

/// AudioPlayer.PlaybackStopped: keep the position for a later resume.
pub async fn playback_stopped(state: &AppState, session: &SkillSession<'_>, event: &PlaybackEvent) -> ResponseEnvelope {
    info!(offset = event.offset_in_milliseconds, token = ?event.token, "Playback stopped");
    remember(state, session, UserRecordUpdate::offset(event.offset_in_milliseconds)).await;
    ResponseEnvelope::empty()
}

pub async fn resume(state: &AppState, session: &SkillSession<'_>) -> ResponseEnvelope {
    let user = last_played(state, session).await;
    info!(offset = user.offset_in_milliseconds, "Resuming playback");
    play_last(state, &user, user.offset_in_milliseconds)
}

pub async fn start_over(state: &AppState, session: &SkillSession<'_>) -> ResponseEnvelope {
    let user = last_played(state, session).await;
    info!("Starting playback over");
    play_last(state, &user, 0)
}

fn play_last(state: &AppState, user: &UserRecord, offset_in_milliseconds: i64) -> ResponseEnvelope {
    if !user.has_track() {
        return ResponseBuilder::new()
            .speak("There is nothing to resume. Try asking for the latest homily.")
            .end_session(true)
            .build();
    }
    ResponseBuilder::new()
        .directive(Directive::play(
            &user.last_token,
            &user.last_track,
            offset_in_milliseconds,
            HOMILY_TITLE,
            &state.config.parish_name,
        ))
        .end_session(true)
        .build()
}

/// Cancel, Stop and Pause. With a player present the position is saved (once
/// the player reports STOPPED) and playback is stopped.
pub async fn stop(state: &AppState, session: &SkillSession<'_>) -> ResponseEnvelope {
    let Some(player) = session.audio_player() else {
        return ResponseBuilder::new().speak("Canceling").end_session(true).build();
    };

    if player.is_stopped() {
        info!(offset = player.offset_in_milliseconds, token = ?player.token, "Saving offset on stop");
        remember(state, session, UserRecordUpdate::offset(player.offset_in_milliseconds)).await;
    }

    ResponseBuilder::new()
        .directive(Directive::Stop)
        .end_session(true)
        .build()
}

/// Next, Previous, Loop, Shuffle and Repeat: there is no playlist to act on.
pub fn unsupported() -> ResponseEnvelope {
    ResponseBuilder::new().end_session(true).build()
}

#[cfg(test)]
mod tests {
    use super::super::handle;
    use super::super::testing::*;
    use crate::envelope::{Directive, RequestEnvelope};
    use serde_json::json;
    use shared::models::UserRecordUpdate;
    use shared::ParishData;

    const USER: &str = "amzn1.ask.account.TEST";

    fn audio_request(request: serde_json::Value, player: serde_json::Value) -> RequestEnvelope {
        serde_json::from_value(json!({
            "context": {
                "System": {"user": {"userId": USER}},
                "AudioPlayer": player
            },
            "request": request
        }))
        .unwrap()
    }

    fn played(response: &crate::envelope::ResponseEnvelope) -> Option<(String, i64)> {
        response.response.directives.iter().find_map(|directive| match directive {
            Directive::Play { audio_item, .. } => {
                Some((audio_item.stream.url.clone(), audio_item.stream.offset_in_milliseconds))
            }
            _ => None,
        })
    }

    #[tokio::test]
    async fn test_homily_records_track() {
        let fx = fixture().await;
        let response = handle(&fx.state, &intent("LatestHomilyIntent", json!({}), false), friday_at(9, 0))
            .await
            .unwrap();
        let (url, offset) = played(&response).unwrap();
        assert_eq!(url, fx.state.config.homily_url);
        assert_eq!(offset, 0);

        let user = ParishData::new(fx.store.clone()).user(USER).await;
        assert_eq!(user.last_track, fx.state.config.homily_url);
        assert_eq!(user.last_token, fx.state.config.homily_token);
    }

    #[tokio::test]
    async fn test_latest_talk_plays_newest() {
        let fx = fixture().await;
        for (ns, day) in [("talk:a", 4), ("talk:b", 11)] {
            fx.store
                .put(
                    ns,
                    json!({
                        "eventCategory": "talk",
                        "url": format!("https://example.com/{}.mp3", day),
                        "eventTitle": ns,
                        "eventYear": 2026, "eventMonth": 10, "eventDay": day
                    }),
                )
                .await;
        }
        let response = handle(&fx.state, &intent("LatestTalkIntent", json!({}), false), friday_at(9, 0))
            .await
            .unwrap();
        assert_eq!(played(&response).unwrap().0, "https://example.com/11.mp3");
        assert_eq!(speech(&response), "Okay. Here is a talk from Sunday, October 11, 2026.");
    }

    #[tokio::test]
    async fn test_stopped_then_resume_uses_offset() {
        let fx = fixture().await;
        let data = ParishData::new(fx.store.clone());
        data.save_user(USER, &UserRecordUpdate::track("tok", "https://example.com/h.mp3"))
            .await
            .unwrap();

        let stopped = audio_request(
            json!({"type": "AudioPlayer.PlaybackStopped", "token": "tok", "offsetInMilliseconds": 61000}),
            json!({"playerActivity": "STOPPED", "token": "tok", "offsetInMilliseconds": 61000}),
        );
        let response = handle(&fx.state, &stopped, friday_at(9, 0)).await.unwrap();
        assert!(response.response.output_speech.is_none());

        let resume = handle(&fx.state, &intent("AMAZON.ResumeIntent", json!({}), false), friday_at(9, 5))
            .await
            .unwrap();
        assert_eq!(
            played(&resume),
            Some(("https://example.com/h.mp3".to_string(), 61000))
        );

        let over = handle(&fx.state, &intent("AMAZON.StartOverIntent", json!({}), false), friday_at(9, 6))
            .await
            .unwrap();
        assert_eq!(played(&over).unwrap().1, 0);
    }

    #[tokio::test]
    async fn test_resume_with_nothing_played() {
        let fx = fixture().await;
        let response = handle(&fx.state, &intent("AMAZON.ResumeIntent", json!({}), false), friday_at(9, 0))
            .await
            .unwrap();
        assert!(played(&response).is_none());
        assert!(speech(&response).contains("nothing to resume"));
    }

    #[tokio::test]
    async fn test_pause_saves_offset_when_stopped() {
        let fx = fixture().await;
        let pause = audio_request(
            json!({"type": "IntentRequest", "intent": {"name": "AMAZON.PauseIntent"}}),
            json!({"playerActivity": "STOPPED", "offsetInMilliseconds": 4200}),
        );
        let response = handle(&fx.state, &pause, friday_at(9, 0)).await.unwrap();
        assert_eq!(response.response.directives, vec![Directive::Stop]);

        let user = ParishData::new(fx.store.clone()).user(USER).await;
        assert_eq!(user.offset_in_milliseconds, 4200);
    }

    #[tokio::test]
    async fn test_playback_progress_events_get_empty_responses() {
        let fx = fixture().await;
        for kind in ["AudioPlayer.PlaybackStarted", "AudioPlayer.PlaybackNearlyFinished", "AudioPlayer.PlaybackFinished"] {
            let event = audio_request(
                json!({"type": kind, "token": "tok", "offsetInMilliseconds": 1000}),
                json!({"playerActivity": "PLAYING", "token": "tok", "offsetInMilliseconds": 1000}),
            );
            let response = handle(&fx.state, &event, friday_at(9, 0)).await.unwrap();
            assert!(response.response.output_speech.is_none());
            assert!(response.response.directives.is_empty());
        }

        let user = ParishData::new(fx.store.clone()).user(USER).await;
        assert_eq!(user.offset_in_milliseconds, 0);
    }

    #[tokio::test]
    async fn test_unsupported_audio_intents_are_no_ops() {
        let fx = fixture().await;
        for name in ["AMAZON.NextIntent", "AMAZON.ShuffleOnIntent", "AMAZON.RepeatIntent"] {
            let response = handle(&fx.state, &intent(name, json!({}), false), friday_at(9, 0))
                .await
                .unwrap();
            assert!(response.response.output_speech.is_none());
            assert!(response.response.directives.is_empty());
        }
    }
}
